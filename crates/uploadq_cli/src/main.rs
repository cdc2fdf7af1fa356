mod config;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use uploadq_record::{sort_for_display, InMemoryUploadActivity, UploadRecord};

use crate::config::RuntimeConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Build and inspect queued upload records")]
struct Cli {
    #[arg(long, global = true, default_value = "config/uploadctl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a record and write its parcel form
    New {
        #[arg(long)]
        local: String,
        #[arg(long)]
        remote: String,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        id: Option<i64>,
        /// Parcel output file; hex on stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Decode a parcel file and print its fields
    Inspect {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Report whether the record's local file is present
    Exists { file: PathBuf },
    /// Print parcel files in upload list order
    Order {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Parcel files of uploads currently transferring
        #[arg(long)]
        active: Vec<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct RecordView<'a> {
    #[serde(flatten)]
    record: &'a UploadRecord,
    mime_type: String,
    finished_at: Option<String>,
    local_file_present: bool,
    automatic_upload: bool,
}

impl<'a> RecordView<'a> {
    fn of(record: &'a UploadRecord) -> Self {
        Self {
            record,
            mime_type: record.mime_type().to_string(),
            finished_at: record.finished_at().map(|at| at.to_rfc3339()),
            local_file_present: record.exists(),
            automatic_upload: record.created_by().is_automatic(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::New {
            local,
            remote,
            account,
            id,
            out,
        } => {
            let config = RuntimeConfig::load(&cli.config)?;
            new_record(&config, local, remote, account, id, out)
        }
        Command::Inspect { file, json } => inspect(&file, json),
        Command::Exists { file } => exists(&file),
        Command::Order { files, active } => order(&files, &active),
    }
}

fn new_record(
    config: &RuntimeConfig,
    local: String,
    remote: String,
    account: Option<String>,
    id: Option<i64>,
    out: Option<PathBuf>,
) -> Result<()> {
    let account = account
        .or_else(|| config.account.default_name.clone())
        .ok_or_else(|| anyhow!("no --account given and no account.default_name configured"))?;

    let mut record = UploadRecord::new(local, remote, account)?;
    record.apply_policy(&config.policy);
    if let Some(id) = id {
        record.set_upload_id(id);
    }

    let bytes = record.to_parcel();
    match out {
        Some(path) => {
            std::fs::write(&path, &bytes)
                .with_context(|| format!("failed writing {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "parcel written");
        }
        None => println!("{}", to_hex(&bytes)),
    }
    Ok(())
}

fn inspect(file: &Path, json: bool) -> Result<()> {
    let record = read_parcel(file)?;
    if json {
        let rendered =
            serde_json::to_string_pretty(&RecordView::of(&record)).context("render record")?;
        println!("{rendered}");
        return Ok(());
    }

    for line in describe(&record) {
        println!("{line}");
    }
    Ok(())
}

fn describe(record: &UploadRecord) -> Vec<String> {
    let origin = if record.created_by().is_automatic() {
        "automatic"
    } else {
        "manual"
    };
    vec![
        record.to_string(),
        format!("  id:              {}", record.upload_id()),
        format!("  remote:          {}", record.remote_path()),
        format!("  account:         {}", record.account_name()),
        format!("  mime type:       {}", record.mime_type()),
        format!("  local action:    {:?}", record.local_action()),
        format!("  on collision:    {:?}", record.name_collision_policy()),
        format!("  create folder:   {}", record.create_remote_folder()),
        format!("  created by:      {:?} ({origin})", record.created_by()),
        format!("  wifi only:       {}", record.use_wifi_only()),
        format!("  charging only:   {}", record.while_charging_only()),
        match record.finished_at() {
            Some(at) => format!("  finished at:     {}", at.to_rfc3339()),
            None => "  finished at:     -".to_string(),
        },
    ]
}

fn exists(file: &Path) -> Result<()> {
    let record = read_parcel(file)?;
    if record.exists() {
        println!("present: {}", record.local_path());
    } else {
        warn!(local_path = %record.local_path(), "local file missing");
        println!("missing: {}", record.local_path());
    }
    Ok(())
}

fn order(files: &[PathBuf], active: &[PathBuf]) -> Result<()> {
    for line in order_lines(files, active)? {
        println!("{line}");
    }
    Ok(())
}

fn order_lines(files: &[PathBuf], active: &[PathBuf]) -> Result<Vec<String>> {
    let records = files
        .iter()
        .map(|path| read_parcel(path))
        .collect::<Result<Vec<_>>>()?;

    let activity = InMemoryUploadActivity::new();
    for path in active {
        activity.begin(&read_parcel(path)?);
    }
    info!(
        records = records.len(),
        uploading = activity.active_count(),
        "ordering upload list"
    );

    Ok(sort_for_display(&records, Some(&activity))
        .into_iter()
        .map(|(snapshot, index)| {
            format!(
                "{}\t{}\t{}\t{}",
                files[index].display(),
                snapshot.upload_id,
                snapshot.status,
                if snapshot.uploading_now { "uploading" } else { "-" }
            )
        })
        .collect())
}

fn read_parcel(path: &Path) -> Result<UploadRecord> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    UploadRecord::from_parcel(&bytes).with_context(|| format!("invalid parcel {}", path.display()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use uploadq_record::{CreatedBy, NameCollisionPolicy, TransferPolicy, UploadStatus};

    use super::*;
    use crate::config::AccountSection;

    #[test]
    fn hex_is_lowercase_and_zero_padded() {
        assert_eq!(to_hex(&[0x00, 0x0f, 0xab, 0xff]), "000fabff");
    }

    #[test]
    fn new_record_applies_config_and_writes_parcel() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("a.parcel");
        let config = RuntimeConfig {
            account: AccountSection {
                default_name: Some("dana@server".to_string()),
            },
            policy: TransferPolicy {
                while_charging_only: true,
                name_collision_policy: NameCollisionPolicy::Rename,
                ..TransferPolicy::default()
            },
        };

        new_record(
            &config,
            "/sdcard/a.jpg".to_string(),
            "/Photos/a.jpg".to_string(),
            None,
            Some(8),
            Some(out.clone()),
        )
        .expect("new record");

        let record = read_parcel(&out).expect("read back");
        assert_eq!(record.account_name(), "dana@server");
        assert_eq!(record.upload_id(), 8);
        assert!(record.while_charging_only());
        assert_eq!(record.name_collision_policy(), NameCollisionPolicy::Rename);
        assert_eq!(record.upload_status(), UploadStatus::InProgress);
    }

    #[test]
    fn new_record_needs_an_account() {
        let err = new_record(
            &RuntimeConfig::default(),
            "/sdcard/a.jpg".to_string(),
            "/Photos/a.jpg".to_string(),
            None,
            None,
            None,
        )
        .expect_err("no account");
        assert!(err.to_string().contains("--account"));
    }

    #[test]
    fn view_flattens_record_fields() {
        let record = UploadRecord::new("/sdcard/a.jpg", "/Photos/a.jpg", "user@server")
            .expect("valid record");
        let value = serde_json::to_value(RecordView::of(&record)).expect("json");

        assert_eq!(value["remote_path"], "/Photos/a.jpg");
        assert_eq!(value["upload_status"], "UPLOAD_IN_PROGRESS");
        assert_eq!(value["mime_type"], "image/jpeg");
        assert!(value["finished_at"].is_null());
        assert_eq!(value["automatic_upload"], false);
    }

    #[test]
    fn describe_marks_instant_uploads_automatic() {
        let mut record = UploadRecord::new("/sdcard/DCIM/a.jpg", "/Photos/a.jpg", "user@server")
            .expect("valid record");
        record.set_created_by(CreatedBy::InstantPicture);

        let lines = describe(&record);
        assert!(lines
            .iter()
            .any(|line| line.ends_with("InstantPicture (automatic)")));

        record.set_created_by(CreatedBy::User);
        assert!(describe(&record)
            .iter()
            .any(|line| line.ends_with("User (manual)")));
        assert_eq!(
            serde_json::to_value(RecordView::of(&record)).expect("json")["automatic_upload"],
            false
        );
    }

    #[test]
    fn order_lists_active_uploads_first_with_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let write = |name: &str, id: i64, status: UploadStatus| {
            let mut record =
                UploadRecord::new(format!("/sdcard/{name}"), format!("/{name}"), "user@server")
                    .expect("valid record");
            record.set_upload_id(id);
            record.transition(status);
            let path = dir.path().join(format!("{name}.parcel"));
            std::fs::write(&path, record.to_parcel()).expect("write parcel");
            path
        };
        let done = write("done.jpg", 1, UploadStatus::Succeeded);
        let running = write("running.jpg", 2, UploadStatus::InProgress);

        let lines = order_lines(&[done.clone(), running.clone()], &[running.clone()])
            .expect("order");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&running.display().to_string()));
        assert!(lines[0].ends_with("\tuploading"));
        assert!(lines[1].ends_with("UPLOAD_SUCCEEDED\t-"));
    }
}
