use crate::config::ColorRange;
use crate::minimap::MinimapImage;
use image::{GrayImage, Luma, RgbImage};
use minimap_state::Side;

/// Foreground value of a binary mask
pub const MASK_ON: u8 = 255;

/// Binary masks of team-colored marker rings.
#[derive(Debug, Clone)]
pub struct TeamMasks {
    pub ally: GrayImage,
    pub enemy: GrayImage,
}

impl TeamMasks {
    pub fn side(&self, side: Side) -> &GrayImage {
        match side {
            Side::Ally => &self.ally,
            Side::Enemy => &self.enemy,
        }
    }
}

pub fn segment(minimap: &MinimapImage, ally: &ColorRange, enemy: &ColorRange) -> TeamMasks {
    TeamMasks {
        ally: color_mask(minimap.rgb(), ally),
        enemy: color_mask(minimap.rgb(), enemy),
    }
}

pub fn color_mask(rgb: &RgbImage, range: &ColorRange) -> GrayImage {
    let mut mask = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, px) in rgb.enumerate_pixels() {
        if range.contains(px.0) {
            mask.put_pixel(x, y, Luma([MASK_ON]));
        }
    }
    mask
}

pub fn count_on(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] == MASK_ON).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ALLY_RANGE, ENEMY_RANGE};
    use image::Rgb;

    #[test]
    fn test_segment_splits_teams() {
        let mut rgb = RgbImage::from_pixel(10, 10, Rgb([30, 45, 35]));
        rgb.put_pixel(1, 1, Rgb([80, 150, 210]));
        rgb.put_pixel(2, 2, Rgb([200, 50, 50]));
        rgb.put_pixel(3, 3, Rgb([200, 50, 50]));
        let minimap = MinimapImage::from_rgb(rgb).unwrap();

        let masks = segment(&minimap, &ALLY_RANGE, &ENEMY_RANGE);
        assert_eq!(count_on(&masks.ally), 1);
        assert_eq!(count_on(&masks.enemy), 2);
        assert_eq!(masks.side(Side::Ally).get_pixel(1, 1).0[0], MASK_ON);
        assert_eq!(masks.side(Side::Enemy).get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn test_no_matching_pixels_gives_empty_mask() {
        let rgb = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let mask = color_mask(&rgb, &ALLY_RANGE);
        assert_eq!(count_on(&mask), 0);
    }
}
