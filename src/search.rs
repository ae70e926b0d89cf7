//! Best-edition selection for search results.
//!
//! A release group bundles many uploads of the same material, so the
//! edition with the most seeders is picked rather than the best bitrate.

use tracing::debug;

use crate::error::{GazelleError, Result};
use crate::models::{ReleaseGroup, SelectedEdition, Torrent};

/// Pick the best edition of `album` by `artist` from browse results.
///
/// The first group whose artist and album match exactly (case-sensitive)
/// is used. Within it, the torrent with the most seeders wins; ties go to
/// the earliest torrent in server order.
///
/// # Errors
///
/// Returns `NotFound` if no group matches or the matching group has no
/// torrents.
pub fn pick(groups: &[ReleaseGroup], artist: &str, album: &str) -> Result<SelectedEdition> {
    let group = groups
        .iter()
        .find(|g| g.matches(artist, album))
        .ok_or_else(|| GazelleError::NotFound(format!("no release group for {} - {}", artist, album)))?;

    let best = most_seeded(&group.torrents).ok_or_else(|| {
        GazelleError::NotFound(format!("release group {} has no torrents", group.group_id))
    })?;

    debug!(
        group_id = group.group_id,
        torrent_id = best.torrent_id,
        seeders = best.seeders,
        "Selected edition"
    );

    Ok(SelectedEdition {
        artist: group.artist.clone(),
        album: group.group_name.clone(),
        image: group.cover.clone(),
        year: group.group_year,
        torrent_id: best.torrent_id,
        encoding: best.encoding.clone(),
    })
}

/// First torrent with the highest seeder count.
fn most_seeded(torrents: &[Torrent]) -> Option<&Torrent> {
    // `Iterator::max_by_key` keeps the last maximum, so reduce by hand.
    torrents
        .iter()
        .reduce(|best, t| if t.seeders > best.seeders { t } else { best })
}
