// Command-line front end for the feedback pipeline.
//
// Each subcommand loads the decoded data file, builds a `ViewState` from the
// flags, runs one derivation and prints Markdown previews (or writes CSV/JSON
// exports). All analytical work happens in the library.
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use feedback_report::browse::{sort_records, SortField, SortOrder, SortSpec};
use feedback_report::filter::{apply_filters, FilterDimension, FilterState, SearchScope, Selection};
use feedback_report::history::UploadHistory;
use feedback_report::loader;
use feedback_report::output;
use feedback_report::period::{resolve_all, PeriodGranularity};
use feedback_report::pipeline::{DashboardSnapshot, ViewState, DEFAULT_PAGE_SIZE};
use feedback_report::trend::{insight_lines, trend_deltas, TrendReport};
use feedback_report::types::{DerivedRecord, ReviewRecord};
use feedback_report::util;

#[derive(Parser)]
#[command(name = "feedback-report")]
#[command(about = "Breakdowns, trends and a review browser for labeled customer feedback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct FilterArgs {
    #[arg(long, default_value = "all")]
    region: String,
    /// Area manager name
    #[arg(long, default_value = "all")]
    manager: String,
    #[arg(long, default_value = "all")]
    store: String,
    #[arg(long, default_value = "all")]
    aggregator: String,
    /// Meta-cluster (category) label
    #[arg(long, default_value = "all")]
    meta: String,
    #[arg(long, default_value = "all")]
    subject: String,
    /// Case-insensitive text to look for in remarks
    #[arg(long)]
    search: Option<String>,
    /// Also match the search text against cluster and category labels
    #[arg(long)]
    search_labels: bool,
}

impl FilterArgs {
    fn to_state(&self) -> FilterState {
        let scope = if self.search_labels {
            SearchScope::RemarkAndLabels
        } else {
            SearchScope::Remark
        };
        FilterState::default()
            .with(FilterDimension::Region, Selection::parse(&self.region))
            .with(FilterDimension::AreaManager, Selection::parse(&self.manager))
            .with(FilterDimension::Store, Selection::parse(&self.store))
            .with(FilterDimension::Aggregator, Selection::parse(&self.aggregator))
            .with(FilterDimension::MetaCluster, Selection::parse(&self.meta))
            .with(FilterDimension::Subject, Selection::parse(&self.subject))
            .with_search(self.search.clone().unwrap_or_default(), scope)
    }
}

#[derive(Args, Clone)]
struct DataArgs {
    /// Decoded feedback file: .csv with a header row, or a .json array of row objects
    #[arg(long, env = "FEEDBACK_DATA")]
    data: PathBuf,
    /// Time bucket size for series and trends
    #[arg(long, default_value_t = PeriodGranularity::Monthly)]
    period: PeriodGranularity,
    #[command(flatten)]
    filters: FilterArgs,
}

impl DataArgs {
    fn view(&self) -> ViewState {
        ViewState::default()
            .with_filters(self.filters.to_state())
            .with_granularity(self.period)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TrendKey {
    Meta,
    Cluster,
    Subject,
    Region,
}

#[derive(Subcommand)]
enum Commands {
    /// Headline numbers, breakdowns, time series and insights
    Summary {
        #[command(flatten)]
        data: DataArgs,
        /// Rows shown per breakdown table
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Filter choices still available under the current selection
    Options {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Sorted, paginated review list
    Browse {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value = "date")]
        sort: SortField,
        #[arg(long, default_value = "desc")]
        order: SortOrder,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, env = "FEEDBACK_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
    },
    /// Rising and falling labels between the first and second half
    Trends {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, value_enum, default_value_t = TrendKey::Meta)]
        by: TrendKey,
    },
    /// Write every view to CSV files plus a JSON snapshot
    Export {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
    /// List upload jobs from a saved history file
    History {
        #[arg(long, env = "FEEDBACK_HISTORY")]
        file: PathBuf,
    },
}

/// Load and admit the data file, printing a short diagnostic like the
/// dashboard's upload banner.
fn load(args: &DataArgs) -> anyhow::Result<Vec<ReviewRecord>> {
    let (records, report) = loader::load_rows(&args.data)
        .with_context(|| format!("failed to load {}", args.data.display()))?;
    println!(
        "Processing dataset... ({} rows read, {} admitted)",
        util::format_int(report.total_rows),
        util::format_int(report.admitted_rows)
    );
    if report.rejected_rows > 0 {
        println!(
            "Note: {} rows skipped for missing store, remark or cluster label.",
            util::format_int(report.rejected_rows)
        );
    }
    if report.undated_rows > 0 {
        println!(
            "Note: {} rows have no readable date and are left out of time views.",
            util::format_int(report.undated_rows)
        );
    }
    println!();
    Ok(records)
}

fn filtered(records: &[ReviewRecord], view: &ViewState) -> Vec<DerivedRecord> {
    apply_filters(&resolve_all(records, view.granularity), &view.filters)
}

fn trends_by(records: &[DerivedRecord], by: TrendKey, period: PeriodGranularity) -> TrendReport {
    match by {
        TrendKey::Meta => trend_deltas(records, |r| r.record.meta_label.as_str(), period),
        TrendKey::Cluster => trend_deltas(records, |r| r.record.cluster_label.as_str(), period),
        TrendKey::Subject => trend_deltas(records, |r| r.record.subject.as_str(), period),
        TrendKey::Region => trend_deltas(records, |r| r.record.region.as_str(), period),
    }
}

fn print_insights(report: &TrendReport) {
    println!("Insights\n");
    for line in insight_lines(report) {
        println!("- {}", line);
    }
    println!();
}

fn handle_summary(data: &DataArgs, top: usize) -> anyhow::Result<()> {
    let records = load(data)?;
    let snapshot = DashboardSnapshot::compute(&records, &data.view())?;
    let summary = &snapshot.summary;
    println!(
        "{} of {} reviews match | {} stores | {} regions | {} clusters | {} categories",
        util::format_int(summary.total_reviews),
        util::format_int(snapshot.dataset_size),
        summary.distinct_stores,
        summary.distinct_regions,
        summary.distinct_clusters,
        summary.distinct_meta_clusters
    );
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("Dated reviews span {} to {}.", first, last);
    }
    println!();

    let b = snapshot.breakdowns.truncated(top);
    output::preview_table("Reviews by Category", None, &output::bucket_rows(&b.by_meta_cluster), top);
    output::preview_table("Top Issue Clusters", None, &output::bucket_rows(&b.by_cluster), top);
    output::preview_table("Reviews by Region", None, &output::bucket_rows(&b.by_region), top);
    output::preview_table("Reviews by Store", None, &output::bucket_rows(&b.by_store), top);
    output::preview_table("Reviews by Subject", None, &output::bucket_rows(&b.by_subject), top);
    output::preview_table("Reviews by Aggregator", None, &output::bucket_rows(&b.by_aggregator), top);
    output::preview_table("Reviews by Fiscal Year", None, &output::bucket_rows(&b.by_fiscal_year), top);

    let note = format!("{} buckets", data.period);
    let series = output::series_rows(&snapshot.time_series);
    output::preview_table("Review Volume Over Time", Some(&note), &series, series.len());
    print_insights(&snapshot.trends);
    Ok(())
}

fn handle_options(data: &DataArgs) -> anyhow::Result<()> {
    let records = load(data)?;
    let view = data.view();
    let snapshot = DashboardSnapshot::compute(&records, &view)?;
    let rows = output::option_rows(&snapshot.options, &view.filters);
    output::preview_table("Filter Choices", Some("each list honours the filters to its left"), &rows, rows.len());
    Ok(())
}

fn handle_browse(data: &DataArgs, sort: SortSpec, page: usize, page_size: usize) -> anyhow::Result<()> {
    let records = load(data)?;
    let view = data.view().with_sort(sort).with_page(page, page_size);
    let snapshot = DashboardSnapshot::compute(&records, &view)?;
    let current = &snapshot.page;
    let note = format!(
        "page {} of {}, {} reviews, sorted by {} {}",
        current.page_number,
        current.total_pages,
        util::format_int(current.total_records),
        sort.field,
        match sort.order {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    );
    let rows = output::review_rows(&current.records);
    output::preview_table("Reviews", Some(&note), &rows, rows.len());
    Ok(())
}

fn handle_trends(data: &DataArgs, by: TrendKey) -> anyhow::Result<()> {
    let records = load(data)?;
    let report = trends_by(&filtered(&records, &data.view()), by, data.period);
    let increasing = output::delta_rows(&report.increasing);
    let decreasing = output::delta_rows(&report.decreasing);
    output::preview_table("Increasing", None, &increasing, increasing.len());
    output::preview_table("Decreasing", None, &decreasing, decreasing.len());
    print_insights(&report);
    Ok(())
}

fn handle_export(data: &DataArgs, out_dir: &Path) -> anyhow::Result<()> {
    let records = load(data)?;
    let view = data.view();
    let snapshot = DashboardSnapshot::compute(&records, &view)?;
    std::fs::create_dir_all(out_dir).with_context(|| format!("cannot create {}", out_dir.display()))?;

    let b = &snapshot.breakdowns;
    let tables = [
        ("categories.csv", &b.by_meta_cluster),
        ("clusters.csv", &b.by_cluster),
        ("regions.csv", &b.by_region),
        ("stores.csv", &b.by_store),
        ("subjects.csv", &b.by_subject),
        ("aggregators.csv", &b.by_aggregator),
        ("fiscal_years.csv", &b.by_fiscal_year),
    ];
    for (name, buckets) in tables {
        output::write_csv(&out_dir.join(name), &output::bucket_rows(buckets))?;
    }
    output::write_csv(&out_dir.join("time_series.csv"), &output::series_rows(&snapshot.time_series))?;
    output::write_csv(
        &out_dir.join("category_subjects.csv"),
        &output::cross_tab_rows(&snapshot.meta_by_subject),
    )?;
    output::write_csv(
        &out_dir.join("category_clusters.csv"),
        &output::cross_tab_rows(&snapshot.meta_by_cluster),
    )?;
    let mut movers = output::delta_rows(&snapshot.trends.increasing);
    movers.extend(output::delta_rows(&snapshot.trends.decreasing));
    output::write_csv(&out_dir.join("trends.csv"), &movers)?;

    let sorted = sort_records(&filtered(&records, &view), view.sort.field, view.sort.order);
    output::write_csv(&out_dir.join("reviews.csv"), &output::review_rows(&sorted))?;
    output::write_json(&out_dir.join("snapshot.json"), &snapshot)?;

    info!(dir = %out_dir.display(), reviews = sorted.len(), "export complete");
    println!("Outputs saved to {}", out_dir.display());
    Ok(())
}

fn handle_history(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
    let history = UploadHistory::from_json(&text)?;
    let rows = history.rows();
    let note = format!("{} still processing", history.outstanding().len());
    output::preview_table("Upload History", Some(&note), &rows, rows.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Summary { data, top } => handle_summary(&data, top),
        Commands::Options { data } => handle_options(&data),
        Commands::Browse {
            data,
            sort,
            order,
            page,
            page_size,
        } => handle_browse(&data, SortSpec { field: sort, order }, page, page_size),
        Commands::Trends { data, by } => handle_trends(&data, by),
        Commands::Export { data, out_dir } => handle_export(&data, &out_dir),
        Commands::History { file } => handle_history(&file),
    }
}
