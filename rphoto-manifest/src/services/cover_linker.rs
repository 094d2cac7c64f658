//! Video/Cover Linker
//!
//! Attaches poster URLs to videos and moves each linked cover image to sit
//! right after its video. Unlinked assets keep their sorted position.

use crate::types::{CoverLinks, PhotoEntry};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Interleave covers after their videos.
///
/// A link only counts when both files exist in `entries`. Links from either
/// direction of `links` are honored; when a cover is claimed by several
/// videos it follows the first one in list order. Entries are only ever
/// reordered: chained links place each cover after its claimant in turn,
/// and a link cycle is entered at its first member in list order.
pub fn link_covers(entries: Vec<PhotoEntry>, links: &CoverLinks) -> Vec<PhotoEntry> {
    if links.is_empty() && links.cover_to_video.is_empty() {
        return entries;
    }

    let present: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    let mut video_to_cover: BTreeMap<&str, &str> = BTreeMap::new();
    for (video, cover) in &links.video_to_cover {
        video_to_cover.insert(video.as_str(), cover.as_str());
    }
    for (cover, video) in &links.cover_to_video {
        video_to_cover.entry(video.as_str()).or_insert(cover.as_str());
    }
    video_to_cover.retain(|video, cover| {
        *video != *cover && present.contains(video) && present.contains(&*cover)
    });

    // Cover → first claiming video in list order
    let mut claimant: HashMap<&str, &str> = HashMap::new();
    for entry in &entries {
        if let Some(cover) = video_to_cover.get(entry.name.as_str()) {
            claimant.entry(*cover).or_insert(entry.name.as_str());
        }
    }
    if claimant.is_empty() {
        return entries;
    }

    // Video → the cover placed right after it
    let follower: HashMap<&str, &str> = claimant.iter().map(|(cover, video)| (*video, *cover)).collect();

    let url_of: HashMap<&str, &str> = entries.iter().map(|e| (e.name.as_str(), e.url.as_str())).collect();
    let posters: HashMap<String, String> = video_to_cover
        .iter()
        .filter_map(|(video, cover)| Some((video.to_string(), url_of.get(cover)?.to_string())))
        .collect();

    let mut order: Vec<usize> = Vec::with_capacity(entries.len());
    let mut placed: HashSet<&str> = HashSet::new();
    let index_of: HashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.name.as_str(), i))
        .collect();

    for entry in &entries {
        let name = entry.name.as_str();
        if placed.contains(name) || waits_for_claimant(name, &claimant) {
            continue;
        }
        let mut next = Some(name);
        while let Some(current) = next.filter(|n| !placed.contains(n)) {
            placed.insert(current);
            order.push(index_of[current]);
            next = follower.get(current).copied();
        }
    }

    let mut slots: Vec<Option<PhotoEntry>> = entries.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .map(|mut entry| {
            if let Some(poster) = posters.get(&entry.name) {
                entry.poster = Some(poster.clone());
            }
            entry
        })
        .collect()
}

/// True when `name` is a claimed cover whose claim chain reaches an
/// unclaimed root; such covers are placed when that chain is. Covers on a
/// claim cycle do not wait.
fn waits_for_claimant(name: &str, claimant: &HashMap<&str, &str>) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(name);
    let mut current = name;
    while let Some(&up) = claimant.get(current) {
        if !seen.insert(up) {
            return false;
        }
        current = up;
    }
    current != name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[&str]) -> Vec<PhotoEntry> {
        names
            .iter()
            .map(|n| PhotoEntry::new(format!("images/r/s/{n}"), *n))
            .collect()
    }

    fn names(entries: &[PhotoEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_cover_moves_after_video_with_poster() {
        let mut links = CoverLinks::default();
        links.link("b.mp4", "a_cover.jpg");

        let out = link_covers(entries(&["a_cover.jpg", "a.jpg", "b.mp4", "c.jpg"]), &links);
        assert_eq!(names(&out), vec!["a.jpg", "b.mp4", "a_cover.jpg", "c.jpg"]);
        assert_eq!(out[1].poster.as_deref(), Some("images/r/s/a_cover.jpg"));
        assert!(out[0].poster.is_none());
    }

    #[test]
    fn test_missing_counterparts_leave_order_untouched() {
        let mut links = CoverLinks::default();
        links.link("gone.mp4", "a.jpg");
        links.link("b.mp4", "gone.jpg");

        let input = entries(&["a.jpg", "b.mp4"]);
        let out = link_covers(input.clone(), &links);
        assert_eq!(out, input);
    }

    #[test]
    fn test_cover_to_video_direction_is_honored() {
        let mut links = CoverLinks::default();
        links
            .cover_to_video
            .insert("z.jpg".to_string(), "a.mp4".to_string());

        let out = link_covers(entries(&["a.mp4", "b.jpg", "z.jpg"]), &links);
        assert_eq!(names(&out), vec!["a.mp4", "z.jpg", "b.jpg"]);
        assert_eq!(out[0].poster.as_deref(), Some("images/r/s/z.jpg"));
    }

    #[test]
    fn test_shared_cover_follows_first_video() {
        let mut links = CoverLinks::default();
        links.link("a.mp4", "c.jpg");
        links.link("b.mp4", "c.jpg");

        let out = link_covers(entries(&["a.mp4", "b.mp4", "c.jpg"]), &links);
        assert_eq!(names(&out), vec!["a.mp4", "c.jpg", "b.mp4"]);
        assert_eq!(out[2].poster.as_deref(), Some("images/r/s/c.jpg"));
    }

    #[test]
    fn test_chained_links_keep_every_asset() {
        let mut links = CoverLinks::default();
        links.link("a.mp4", "b.mp4");
        links.link("b.mp4", "c.jpg");

        let out = link_covers(entries(&["a.mp4", "b.mp4", "c.jpg"]), &links);
        assert_eq!(names(&out), vec!["a.mp4", "b.mp4", "c.jpg"]);
        assert_eq!(out[1].poster.as_deref(), Some("images/r/s/c.jpg"));

        let out = link_covers(entries(&["0.jpg", "c.jpg", "b.mp4", "a.mp4"]), &links);
        assert_eq!(names(&out), vec!["0.jpg", "a.mp4", "b.mp4", "c.jpg"]);
    }

    #[test]
    fn test_link_cycle_keeps_every_asset() {
        let mut links = CoverLinks::default();
        links.link("a.mp4", "b.jpg");
        links.video_to_cover.insert("b.jpg".to_string(), "a.mp4".to_string());

        let out = link_covers(entries(&["a.mp4", "b.jpg", "c.jpg"]), &links);
        assert_eq!(names(&out), vec!["a.mp4", "b.jpg", "c.jpg"]);

        let out = link_covers(entries(&["0.jpg", "b.jpg", "c.jpg", "x.mp4", "a.mp4"]), &links);
        assert_eq!(out.len(), 5);
        assert_eq!(names(&out), vec!["0.jpg", "b.jpg", "a.mp4", "c.jpg", "x.mp4"]);
    }
}
