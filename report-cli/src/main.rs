use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stock_report::{
  export_report, parse_report_date, DocumentAssembler, DocumentMetadata, FsStorageHost,
  LogNotifier, RendererConfig, ReportKind, ReportRow,
};
use tracing_subscriber::EnvFilter;

const APP_DIR_NAME: &str = "stock-report";

#[derive(Parser, Debug)]
#[command(name = "stock-report", about = "Render paginated stock reports to PDF")]
struct Cli {
  /// Renderer configuration JSON (page size, fonts, base font size).
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Render a report from a JSON array of row objects and save it.
  Render {
    #[arg(long)]
    rows: PathBuf,

    #[arg(long, value_enum)]
    kind: KindArg,

    #[arg(long)]
    customer: String,

    /// Title line; defaults to the customer name.
    #[arg(long)]
    title: Option<String>,

    #[arg(long, default_value = "")]
    subtitle: String,

    /// YYYY-MM-DD or an ISO timestamp.
    #[arg(long)]
    from: String,

    #[arg(long)]
    to: String,

    #[arg(long)]
    unit: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Write here instead of the Downloads directory.
    #[arg(long)]
    out_dir: Option<PathBuf>,
  },

  /// Print the page plan for a row count as JSON.
  Plan {
    #[arg(long)]
    rows: usize,
  },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
  Inward,
  Outward,
}

impl From<KindArg> for ReportKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Inward => ReportKind::Inward,
      KindArg::Outward => ReportKind::Outward,
    }
  }
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stock_report=info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  init_logging();
  let cli = Cli::parse();

  let config = match &cli.config {
    Some(path) => RendererConfig::from_path(path)?,
    None => RendererConfig::default(),
  };
  let assembler = DocumentAssembler::new(config);

  match cli.command {
    Command::Render {
      rows,
      kind,
      customer,
      title,
      subtitle,
      from,
      to,
      unit,
      category,
      out_dir,
    } => {
      let rows = read_rows(&rows)?;
      let from = parse_report_date(&from)?;
      let to = parse_report_date(&to)?;
      if to < from {
        anyhow::bail!("--to ({to}) is before --from ({from})");
      }

      let metadata = DocumentMetadata {
        title: title.unwrap_or_else(|| customer.clone()),
        subtitle,
        customer_name: customer,
        kind: kind.into(),
        from,
        to,
        unit,
        category,
      };

      let host = match out_dir {
        Some(dir) => FsStorageHost::with_dirs(Some(dir.clone()), dir),
        None => FsStorageHost::new(APP_DIR_NAME),
      };

      let outcome = export_report(
        &assembler,
        &host,
        &LogNotifier,
        &rows,
        &metadata,
        |percent: u8, message: &str| eprintln!("[{percent:>3}%] {message}"),
      )
      .await?;

      if let Some(warning) = &outcome.warning {
        eprintln!("warning: {}", warning.message());
      }
      println!("{}", outcome.path.display());
    }

    Command::Plan { rows } => {
      let budget = assembler.plan(rows)?;
      println!("{}", serde_json::to_string_pretty(&budget)?);
    }
  }

  Ok(())
}

fn read_rows(path: &std::path::Path) -> anyhow::Result<Vec<ReportRow>> {
  let raw = std::fs::read_to_string(path)
    .map_err(|e| anyhow::anyhow!("failed to read rows {}: {e}", path.display()))?;
  let rows: Vec<ReportRow> = serde_json::from_str(&raw)
    .map_err(|e| anyhow::anyhow!("invalid rows json in {}: {e}", path.display()))?;
  Ok(rows)
}
