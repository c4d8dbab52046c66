/// Clickable link regions of a rendered page, in frame coordinates.
#[derive(Debug, Default, Clone)]
pub struct HitTestIndex {
    links: Vec<LinkRegion>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRegion {
    pub href: String,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl LinkRegion {
    fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w as i32 && y < self.y + self.h as i32
    }
}

impl HitTestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, link: LinkRegion) {
        self.links.push(link);
    }

    pub fn links(&self) -> &[LinkRegion] {
        &self.links
    }

    /// Topmost link under the point; later regions are drawn over earlier ones.
    pub fn hit(&self, x: i32, y: i32) -> Option<&LinkRegion> {
        self.links.iter().rev().find(|link| link.contains(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(href: &str, x: i32, y: i32, w: u32, h: u32) -> LinkRegion {
        LinkRegion {
            href: href.to_string(),
            x,
            y,
            w,
            h,
        }
    }

    #[test]
    fn edges_are_half_open() {
        let mut index = HitTestIndex::new();
        index.add(region("https://a.example", 10, 10, 20, 10));
        assert!(index.hit(10, 10).is_some());
        assert!(index.hit(29, 19).is_some());
        assert!(index.hit(30, 10).is_none());
        assert!(index.hit(10, 20).is_none());
    }

    #[test]
    fn overlapping_regions_prefer_the_latest() {
        let mut index = HitTestIndex::new();
        index.add(region("https://under.example", 0, 0, 100, 100));
        index.add(region("https://over.example", 40, 40, 10, 10));
        assert_eq!(index.hit(45, 45).map(|l| l.href.as_str()), Some("https://over.example"));
        assert_eq!(index.hit(5, 5).map(|l| l.href.as_str()), Some("https://under.example"));
        assert_eq!(index.links().len(), 2);
    }
}
