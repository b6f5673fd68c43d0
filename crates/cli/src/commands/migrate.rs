use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use photomigrate_core::store::ContentStore;
use photomigrate_core::{MigrateProgress, Migrator};

fn active_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "  {bar:30.cyan/blue} {spinner:.green} {pos:>5}/{len:<5} {prefix:.dim} {msg}",
    )
    .unwrap()
    .progress_chars("━╸─")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::with_template("  {bar:30.green} {prefix:.green} {msg:.dim}").unwrap()
}

pub fn run<S: ContentStore>(migrator: &Migrator<S>) -> Result<()> {
    let mp = MultiProgress::new();
    let mut active_pb: Option<ProgressBar> = None;
    let mut current_len: u64 = 0;

    let summary = migrator.run(Some(&mut |progress| match progress {
        MigrateProgress::AlbumsStart { total } => {
            mp.println(format!("  Building album structure ({total} albums)"))
                .ok();
            current_len = total as u64;
            let pb = mp.add(ProgressBar::new(current_len));
            pb.set_style(active_style());
            pb.set_prefix("Albums");
            pb.enable_steady_tick(std::time::Duration::from_millis(80));
            active_pb = Some(pb);
        }
        MigrateProgress::AlbumAdded { label } => {
            if let Some(ref pb) = active_pb {
                pb.set_message(label);
                pb.inc(1);
            }
        }
        MigrateProgress::AlbumsSaved { .. } => {
            if let Some(pb) = active_pb.take() {
                pb.set_style(done_style());
                pb.set_prefix("done");
                pb.finish_with_message(format!("Saved {current_len} albums"));
            }
        }
        MigrateProgress::AssetsStart { total } => {
            mp.println(format!("  Importing {total} assets")).ok();
            current_len = total as u64;
            let pb = mp.add(ProgressBar::new(current_len));
            pb.set_style(active_style());
            pb.set_prefix("Assets");
            pb.enable_steady_tick(std::time::Duration::from_millis(80));
            active_pb = Some(pb);
        }
        MigrateProgress::AssetSaved { uuid, .. } => {
            if let Some(ref pb) = active_pb {
                pb.set_message(uuid);
                pb.inc(1);
            }
        }
        MigrateProgress::AssetFailed { uuid, message } => {
            mp.println(format!("  Failed {uuid}: {message}")).ok();
            if let Some(ref pb) = active_pb {
                pb.inc(1);
            }
        }
    }))?;

    if let Some(pb) = active_pb.take() {
        pb.set_style(done_style());
        pb.set_prefix("done");
        pb.finish_with_message(format!("Imported {} assets", summary.assets));
    }

    mp.println(String::new()).ok();
    println!(
        "Migration complete: {} albums, {} assets ({} uploaded, {} already present, {} without derivative, {} failed)",
        summary.albums,
        summary.assets,
        summary.uploaded,
        summary.skipped,
        summary.empty,
        summary.failed
    );
    Ok(())
}
