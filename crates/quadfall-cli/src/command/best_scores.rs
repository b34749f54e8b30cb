use std::{io, path::Path};

use quadfall_engine::GameMode;

use crate::score_file::ScoreFile;

#[derive(Debug, Default, Clone, clap::Args)]
pub(crate) struct BestScoresArg {}

pub(crate) fn run(_arg: &BestScoresArg, scores_path: &Path) -> anyhow::Result<()> {
    let scores = ScoreFile::open(scores_path)?;
    tracing::info!(path = %scores.path().display(), "reading best scores");
    write_table(&mut io::stdout().lock(), &scores)?;
    Ok(())
}

fn write_table<W>(writer: &mut W, scores: &ScoreFile) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(writer, "{:<8} {:>8}  UPDATED", "MODE", "BEST")?;
    for mode in GameMode::ALL {
        let name = mode.to_string();
        match scores.entry(mode.best_score_key()) {
            Some(entry) => writeln!(
                writer,
                "{name:<8} {:>8}  {}",
                entry.score,
                entry.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            )?,
            None => writeln!(writer, "{name:<8} {:>8}  -", "-")?,
        }
    }
    Ok(())
}
