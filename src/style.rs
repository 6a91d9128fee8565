use ratatui::style::Color;

/// Kolor RGBA, kanał alfa w zakresie 0..=1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Terminal nie zna przezroczystości, więc mieszamy z tłem mapy
    pub fn over(self, bg: (u8, u8, u8)) -> Color {
        let mix = |fg: u8, bg: u8| {
            (f64::from(fg) * self.a + f64::from(bg) * (1.0 - self.a)).round() as u8
        };
        Color::Rgb(mix(self.r, bg.0), mix(self.g, bg.1), mix(self.b, bg.2))
    }
}

/// `hsl(h, s%, l%)` na RGB
pub fn hsl(h: f64, s: f64, l: f64) -> Rgba {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round() as u8;
    Rgba::new(to_u8(r), to_u8(g), to_u8(b), 1.0)
}

/// Stały, półprzezroczysty styl obrysu regionu
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionStyle {
    pub stroke: Rgba,
    pub stroke_width: f64,
    pub fill: Rgba,
}

pub const REGION_STYLE: RegionStyle = RegionStyle {
    stroke: Rgba::new(0, 0, 0, 0.5),
    stroke_width: 4.0,
    fill: Rgba::new(0, 0, 0, 0.25),
};

/// Położenie wartości punktu względem mediany regionu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointBucket {
    Below,
    Equal,
    Above,
}

impl PointBucket {
    pub fn classify(value: f64, median: f64) -> Self {
        if value < median {
            Self::Below
        } else if value > median {
            Self::Above
        } else {
            Self::Equal
        }
    }

    pub fn hue(self) -> f64 {
        match self {
            Self::Below => 220.0,
            Self::Equal => 110.0,
            Self::Above => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Below => "below median",
            Self::Equal => "at median",
            Self::Above => "above median",
        }
    }
}

/// Promień symbolu punktu w pikselach
pub const POINT_RADIUS: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub bucket: PointBucket,
    pub radius: f64,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f64,
}

impl PointStyle {
    pub fn for_value(value: f64, median: f64) -> Self {
        let bucket = PointBucket::classify(value, median);
        Self {
            bucket,
            radius: POINT_RADIUS,
            fill: hsl(bucket.hue(), 0.5, 0.5),
            stroke: Rgba::new(255, 255, 255, 1.0),
            stroke_width: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_median_is_equal_bucket() {
        assert_eq!(PointBucket::classify(4.0, 4.0), PointBucket::Equal);
        assert_eq!(PointBucket::classify(3.99, 4.0), PointBucket::Below);
        assert_eq!(PointBucket::classify(4.01, 4.0), PointBucket::Above);
    }

    #[test]
    fn nan_falls_into_equal_bucket() {
        assert_eq!(PointBucket::classify(f64::NAN, 4.0), PointBucket::Equal);
    }

    #[test]
    fn bucket_hues() {
        assert_eq!(hsl(220.0, 0.5, 0.5), Rgba::new(64, 106, 191, 1.0));
        assert_eq!(hsl(0.0, 0.5, 0.5), Rgba::new(191, 64, 64, 1.0));
        assert_eq!(hsl(110.0, 0.5, 0.5), Rgba::new(85, 191, 64, 1.0));
        assert_eq!(PointStyle::for_value(4.0, 4.0).fill, hsl(110.0, 0.5, 0.5));
    }

    #[test]
    fn alpha_blends_over_background() {
        assert_eq!(REGION_STYLE.stroke.over((255, 255, 255)), Color::Rgb(128, 128, 128));
        assert_eq!(REGION_STYLE.fill.over((200, 200, 200)), Color::Rgb(150, 150, 150));
    }
}
