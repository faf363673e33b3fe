use chrono::{Local, TimeZone};
use colored::*;
use std::io::{self, BufRead, Write};
use std::path::Path;

use dupehound_core::{CancelToken, DuplicateGroup, Error, GroupStream, InteractOutcome};

/// Per-group action parsed from the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    KeepAll,
    /// 1-based member indices to delete.
    Delete(Vec<usize>),
    KeepOldest,
    KeepNewest,
    Quit,
}

/// Walk the group stream, prompting for an action per group.
///
/// The stream is consumed incrementally; quitting stops iteration
/// immediately and leaves the remaining groups unfetched.
pub fn run(
    total: u64,
    groups: GroupStream<'_>,
    cancel: &CancelToken,
) -> Result<InteractOutcome, Error> {
    if total == 0 {
        println!("{}", "No duplicates found.".green());
        return Ok(InteractOutcome::Finished);
    }
    println!("{} duplicate groups\n", total.to_string().red().bold());

    let stdin = io::stdin();
    let mut input = stdin.lock();

    for (position, group) in groups.enumerate() {
        if cancel.is_cancelled() {
            return Ok(InteractOutcome::Quit);
        }
        let group = group?;
        print_group(position + 1, total, &group);

        match prompt_action(&mut input, group.files.len())? {
            Action::Quit => return Ok(InteractOutcome::Quit),
            Action::KeepAll => {}
            Action::Delete(indices) => delete_members(&group, &indices),
            Action::KeepOldest => delete_all_but(&group, index_of_oldest(&group)),
            Action::KeepNewest => delete_all_but(&group, index_of_newest(&group)),
        }
        println!();
    }

    Ok(InteractOutcome::Finished)
}

fn print_group(position: usize, total: u64, group: &DuplicateGroup) {
    let header = match group.hash {
        Some(hash) => format!(
            "[{position}/{total}] {} — hash {hash:016x}",
            human_size(group.size)
        ),
        None => format!("[{position}/{total}] {}", human_size(group.size)),
    };
    println!("{}", header.cyan().bold());

    for (i, file) in group.files.iter().enumerate() {
        let mtime = Local
            .timestamp_opt(file.mtime, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {}. {}  ({})", i + 1, file.path, mtime.dimmed());
    }
}

fn prompt_action(input: &mut impl BufRead, members: usize) -> io::Result<Action> {
    loop {
        print!("[k]eep all, delete list (e.g. 2,3), keep [o]ldest, keep [n]ewest, [q]uit: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // EOF behaves like quit so piped input terminates cleanly.
            return Ok(Action::Quit);
        }

        match parse_action(line.trim(), members) {
            Some(action) => return Ok(action),
            None => println!("{}", "Unrecognized choice.".yellow()),
        }
    }
}

fn parse_action(line: &str, members: usize) -> Option<Action> {
    match line.to_lowercase().as_str() {
        "" | "k" => return Some(Action::KeepAll),
        "o" => return Some(Action::KeepOldest),
        "n" => return Some(Action::KeepNewest),
        "q" => return Some(Action::Quit),
        _ => {}
    }

    let indices = line
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect::<Option<Vec<_>>>()?;
    if indices.is_empty() || indices.iter().any(|&i| i == 0 || i > members) {
        return None;
    }
    // Every group keeps at least one copy.
    let mut unique = indices.clone();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() >= members {
        return None;
    }
    Some(Action::Delete(unique))
}

fn index_of_oldest(group: &DuplicateGroup) -> usize {
    group
        .files
        .iter()
        .enumerate()
        .min_by_key(|(_, f)| f.mtime)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn index_of_newest(group: &DuplicateGroup) -> usize {
    group
        .files
        .iter()
        .enumerate()
        .max_by_key(|(_, f)| f.mtime)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn delete_all_but(group: &DuplicateGroup, keep: usize) {
    let indices: Vec<usize> = (1..=group.files.len()).filter(|&i| i != keep + 1).collect();
    delete_members(group, &indices);
}

fn delete_members(group: &DuplicateGroup, indices: &[usize]) {
    for &index in indices {
        let file = &group.files[index - 1];
        match std::fs::remove_file(Path::new(&file.path)) {
            Ok(()) => println!("  {} {}", "deleted".red(), file.path),
            Err(e) => println!("  {} {}: {}", "failed".yellow(), file.path, e),
        }
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
