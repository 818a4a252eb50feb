use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{ensure, Context};
use clap::Parser;
use log::{error, info, warn};

use pcd_density_filter::prelude::{
    DensityFilter, FilterReport, PointCloudDocument, PointCloudFormat, DEFAULT_BATCH_SIZE,
    DEFAULT_DENSITY_THRESHOLD, DEFAULT_LEAF_SIZE, DEFAULT_SIGMA,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// point cloud file to be filtered (.ply, .txt, .xyz, .csv, .pts supported)
    input: PathBuf,

    /// file the retained points are written to, in the format of the input
    output: PathBuf,

    /// minimum density (points per unit volume) around a retained point
    #[clap(long, default_value_t = DEFAULT_DENSITY_THRESHOLD, value_parser = non_negative)]
    threshold: f64,

    /// standard deviations added to the median distance to get the search radius
    #[clap(long, default_value_t = DEFAULT_SIGMA, value_parser = non_negative)]
    sigma: f64,

    /// number of points classified per parallel batch
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = positive)]
    batch_size: usize,

    /// maximum number of points in a leaf of the spatial index
    #[clap(long, default_value_t = DEFAULT_LEAF_SIZE, value_parser = positive)]
    leaf_size: usize,

    /// write a json summary of the run to this path
    #[clap(long)]
    report: Option<PathBuf>,
}

fn non_negative(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if v.is_finite() && v >= 0. {
        Ok(v)
    } else {
        Err(format!("{} is not a finite, non-negative number", s))
    }
}

fn positive(s: &str) -> Result<usize, String> {
    let v: usize = s.parse().map_err(|e| format!("{}", e))?;
    if v > 0 {
        Ok(v)
    } else {
        Err("must be at least 1".to_string())
    }
}

async fn handler(args: Args) -> anyhow::Result<()> {
    ensure!(
        args.input.exists(),
        "input file {:?} does not exist!",
        args.input.to_string_lossy()
    );
    if PointCloudFormat::from_path(&args.output) != PointCloudFormat::from_path(&args.input) {
        warn!(
            "{:?} will be written in the format of {:?}",
            args.output, args.input
        );
    }

    let filter = DensityFilter::new()
        .with_threshold(args.threshold)
        .with_sigma(args.sigma)
        .with_batch_size(args.batch_size)
        .with_leaf_size(args.leaf_size);

    info!("Reading {:?}...", args.input);
    let document = PointCloudDocument::read(&args.input)
        .await
        .with_context(|| format!("failed to load {:?}", args.input))?;
    info!("Loaded {} points", document.cloud().len());

    let settings = filter.clone();
    let (document, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = settings.run(document.cloud());
        (document, outcome)
    })
    .await?;
    let outcome = outcome.context("density filtering failed")?;

    let report = FilterReport::new(
        &args.input,
        &args.output,
        document.cloud(),
        &filter,
        &outcome,
    );

    info!("Writing {:?}...", args.output);
    document
        .write_retained(&outcome.mask, &args.output)
        .await
        .context("failed to save the filtered point cloud")?;

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write report {:?}", path))?;
    }

    info!(
        "Kept {} of {} points (radius {:.6})",
        report.retained, report.total, report.estimate.radius
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match handler(args).await {
        Ok(_) => {
            info!("success");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;
    use serial_test::serial;

    use crate::{handler, Args};

    fn args(input: &Path, output: &Path, extra: &[&str]) -> Args {
        let mut argv = vec![
            "pcd-density-filter".to_string(),
            input.display().to_string(),
            output.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    /// 6x6x6 grid with spacing 0.2 followed by a far away point, with an attribute column
    fn cluster_with_outlier() -> String {
        let mut text = String::from("# x y z id\n");
        let mut id = 0;
        for x in 0..6 {
            for y in 0..6 {
                for z in 0..6 {
                    text.push_str(&format!(
                        "{} {} {} {}\n",
                        x as f64 * 0.2,
                        y as f64 * 0.2,
                        z as f64 * 0.2,
                        id
                    ));
                    id += 1;
                }
            }
        }
        text.push_str("500 500 500 outlier\n");
        text
    }

    #[test]
    fn usage_errors() {
        assert!(Args::try_parse_from(["pcd-density-filter"]).is_err());
        assert!(Args::try_parse_from(["pcd-density-filter", "in.ply"]).is_err());
        assert!(Args::try_parse_from(["pcd-density-filter", "a.ply", "b.ply", "c.ply"]).is_err());
        assert!(
            Args::try_parse_from(["pcd-density-filter", "a.ply", "b.ply", "--threshold", "-1"])
                .is_err()
        );
        assert!(
            Args::try_parse_from(["pcd-density-filter", "a.ply", "b.ply", "--batch-size", "0"])
                .is_err()
        );
        let args = Args::try_parse_from(["pcd-density-filter", "a.ply", "b.ply"]).unwrap();
        assert_eq!(args.threshold, 0.1);
        assert_eq!(args.sigma, 3.);
        assert_eq!(args.batch_size, 10_000);
    }

    #[tokio::test]
    #[serial]
    async fn filter_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cloud.txt");
        let output = dir.path().join("filtered.txt");
        let report = dir.path().join("report.json");
        tokio::fs::write(&input, cluster_with_outlier()).await.unwrap();

        // with a single far outlier the spread term would swallow the cluster,
        // so the radius is the median distance alone
        let report_arg = report.display().to_string();
        let extra = ["--sigma", "0", "--threshold", "20", "--report", report_arg.as_str()];
        handler(args(&input, &output, &extra))
            .await
            .unwrap();

        let filtered = tokio::fs::read_to_string(&output).await.unwrap();
        let lines: Vec<_> = filtered.lines().collect();
        assert_eq!(lines[0], "# x y z id");
        assert_eq!(lines.len(), 1 + 216);
        assert!(!filtered.contains("outlier"));
        assert_eq!(lines[216], "1 1 1 215");

        let json: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&report).await.unwrap()).unwrap();
        assert_eq!(json["total"], 217);
        assert_eq!(json["retained"], 216);
        assert_eq!(json["discarded"], 1);
    }

    #[tokio::test]
    #[serial]
    async fn failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("filtered.txt");

        let missing = dir.path().join("missing.txt");
        assert!(handler(args(&missing, &output, &[])).await.is_err());

        let empty = dir.path().join("empty.txt");
        tokio::fs::write(&empty, "# nothing here\n").await.unwrap();
        let e = handler(args(&empty, &output, &[])).await.unwrap_err();
        assert!(format!("{:?}", e).contains("insufficient data"));

        let malformed = dir.path().join("malformed.txt");
        tokio::fs::write(&malformed, "0 0 0\n1 1\n").await.unwrap();
        let e = handler(args(&malformed, &output, &[])).await.unwrap_err();
        assert!(format!("{:?}", e).contains("malformed input"));
        assert!(!output.exists());
    }
}
