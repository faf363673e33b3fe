use serde::Serialize;

use crate::commands::ReportFormat;
use dupehound_core::{Error, GroupStream, InteractOutcome};

#[derive(Serialize)]
struct GroupView {
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    files: Vec<String>,
}

/// Non-interactive output: stream the groups to stdout as text, or collect
/// them into a JSON document.
pub fn run(
    format: ReportFormat,
    total: u64,
    groups: GroupStream<'_>,
) -> Result<InteractOutcome, Error> {
    match format {
        ReportFormat::Text => {
            for group in groups {
                let group = group?;
                match group.hash {
                    Some(hash) => println!("# {} bytes, hash {hash:016x}", group.size),
                    None => println!("# {} bytes", group.size),
                }
                for file in &group.files {
                    println!("{}", file.path);
                }
                println!();
            }
            eprintln!("{total} duplicate groups");
        }
        ReportFormat::Json => {
            let views = groups
                .map(|group| {
                    group.map(|g| GroupView {
                        size: g.size,
                        hash: g.hash.map(|h| format!("{h:016x}")),
                        files: g.files.into_iter().map(|f| f.path).collect(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let body = serde_json::to_string_pretty(&views)
                .map_err(|e| Error::Other(e.to_string()))?;
            println!("{body}");
        }
    }
    Ok(InteractOutcome::Finished)
}
