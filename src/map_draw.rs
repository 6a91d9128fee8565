use geo::{Coord, Geometry, Intersects, LineString, Point, Polygon, Rect};
use ratatui::layout::Rect as TuiRect;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line, Map, MapResolution, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::data::MapFeature;
use crate::style::{PointStyle, POINT_RADIUS, REGION_STYLE};

pub const BASE_LAYER: &str = "Basemap";

/// Tło mapy, na nim mieszamy półprzezroczyste style
pub const MAP_BACKGROUND: (u8, u8, u8) = (242, 239, 233);

/// Co ile pikseli kładziemy kropkę wypełnienia regionu
const FILL_STEP: usize = 6;

/// Najmniejsza rozdzielczość, do jakiej da się przybliżyć (zoom 20)
const MIN_RESOLUTION: f64 = 360.0 / (256.0 * 1_048_576.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InteractionId(u64);

#[derive(Clone, Debug)]
pub enum LayerSource {
    /// Zarys świata wbudowany w ratatui
    Base,
    Region(Vec<MapFeature>),
    /// Punkty kolorowane względem mediany regionu
    Points { features: Vec<MapFeature>, median: f64 },
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub source: LayerSource,
}

impl Layer {
    pub fn is_base(&self) -> bool {
        self.name == BASE_LAYER
    }

    fn features(&self) -> &[MapFeature] {
        match &self.source {
            LayerSource::Base => &[],
            LayerSource::Region(f) => f,
            LayerSource::Points { features, .. } => features,
        }
    }
}

/// Interakcja wyboru ograniczona do konkretnych warstw
#[derive(Clone, Debug)]
struct SelectInteraction {
    id: InteractionId,
    layers: Vec<LayerId>,
}

/// Wynik kliknięcia w obiekt mapy
#[derive(Clone, Debug, PartialEq)]
pub struct SelectEvent {
    pub coordinate: Coord<f64>,
    pub feature: MapFeature,
}

/// Widok: środek (lon, lat), rozdzielczość w stopniach na piksel i rozmiar
/// płótna w pikselach brajla (2x4 na komórkę terminala)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub center: Coord<f64>,
    pub resolution: f64,
    pub width: f64,
    pub height: f64,
}

impl View {
    /// Rozdzielczość odpowiadająca poziomowi zoomu kafelków 256 px
    pub fn resolution_for_zoom(zoom: f64) -> f64 {
        360.0 / (256.0 * 2f64.powf(zoom))
    }

    pub fn extent(&self) -> Rect<f64> {
        let hw = self.width * self.resolution / 2.0;
        let hh = self.height * self.resolution / 2.0;
        Rect::new(
            Coord { x: self.center.x - hw, y: self.center.y - hh },
            Coord { x: self.center.x + hw, y: self.center.y + hh },
        )
    }

    pub fn to_map(&self, px: f64, py: f64) -> Coord<f64> {
        Coord {
            x: self.center.x + (px - self.width / 2.0) * self.resolution,
            y: self.center.y - (py - self.height / 2.0) * self.resolution,
        }
    }

    pub fn to_pixel(&self, c: Coord<f64>) -> (f64, f64) {
        (
            (c.x - self.center.x) / self.resolution + self.width / 2.0,
            (self.center.y - c.y) / self.resolution + self.height / 2.0,
        )
    }

    /// Dopasowanie do prostokąta z marginesem w pikselach z każdej strony
    pub fn fit(&mut self, rect: Rect<f64>, padding: f64) {
        self.center = rect.center();
        let usable_w = (self.width - 2.0 * padding).max(1.0);
        let usable_h = (self.height - 2.0 * padding).max(1.0);
        let res = (rect.width() / usable_w).max(rect.height() / usable_h);
        // punkt albo linia pozioma/pionowa: zostaje dotychczasowa skala
        if res.is_finite() && res > 0.0 {
            self.resolution = res;
        }
    }
}

/// Powierzchnia mapy: stos warstw, widok i podpięte interakcje
pub struct MapSurface {
    layers: Vec<Layer>,
    view: View,
    interactions: Vec<SelectInteraction>,
    next_id: u64,
}

impl MapSurface {
    pub fn new(center: Coord<f64>, zoom: f64) -> Self {
        let view = View {
            center,
            resolution: View::resolution_for_zoom(zoom),
            width: 200.0,
            height: 160.0,
        };
        let base = Layer { id: LayerId(0), name: BASE_LAYER.to_string(), source: LayerSource::Base };
        Self { layers: vec![base], view, interactions: Vec::new(), next_id: 1 }
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    #[cfg(test)]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[cfg(test)]
    pub fn non_base_layer_count(&self) -> usize {
        self.layers.iter().filter(|l| !l.is_base()).count()
    }

    pub fn add_layer(&mut self, name: &str, source: LayerSource) -> LayerId {
        let id = LayerId(self.next());
        self.layers.push(Layer { id, name: name.to_string(), source });
        id
    }

    /// Usuwa wszystkie warstwy poza bazową
    pub fn remove_non_base_layers(&mut self) {
        self.layers.retain(Layer::is_base);
    }

    pub fn fit(&mut self, rect: Rect<f64>, padding: f64) {
        self.view.fit(rect, padding);
    }

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        self.view.width = width.max(1.0);
        self.view.height = height.max(1.0);
    }

    pub fn pan(&mut self, dx_px: f64, dy_px: f64) {
        self.view.center.x += dx_px * self.view.resolution;
        self.view.center.y -= dy_px * self.view.resolution;
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.view.resolution = (self.view.resolution / factor).max(MIN_RESOLUTION);
    }

    pub fn add_interaction(&mut self, layers: Vec<LayerId>) -> InteractionId {
        let id = InteractionId(self.next());
        self.interactions.push(SelectInteraction { id, layers });
        id
    }

    pub fn remove_interaction(&mut self, id: InteractionId) -> bool {
        let before = self.interactions.len();
        self.interactions.retain(|i| i.id != id);
        before != self.interactions.len()
    }

    #[cfg(test)]
    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    /// Kliknięcie w piksel płótna; zdarzenie tylko gdy aktywna interakcja
    /// trafi w obiekt jednej ze swoich warstw
    pub fn select_at(&self, px: f64, py: f64) -> Option<SelectEvent> {
        let coordinate = self.view.to_map(px, py);
        self.interactions.iter().find_map(|interaction| {
            self.hit_test(coordinate, &interaction.layers)
                .map(|feature| SelectEvent { coordinate, feature: feature.clone() })
        })
    }

    /// Szuka obiektu od najwyższej warstwy; punkty w promieniu symbolu
    pub fn hit_test(&self, coordinate: Coord<f64>, scope: &[LayerId]) -> Option<&MapFeature> {
        let click = Point::from(coordinate);
        let tolerance = POINT_RADIUS * self.view.resolution;

        self.layers
            .iter()
            .rev()
            .filter(|l| scope.contains(&l.id))
            .flat_map(|l| l.features().iter())
            .find(|f| match &f.geometry {
                Geometry::Point(p) => distance(p.0, coordinate) <= tolerance,
                Geometry::MultiPoint(mp) => mp.iter().any(|p| distance(p.0, coordinate) <= tolerance),
                g => g.intersects(&click),
            })
    }

    pub fn render(&self, f: &mut Frame, area: TuiRect, title: &str, cursor: Option<Coord<f64>>) {
        let extent = self.view.extent();
        let (bg_r, bg_g, bg_b) = MAP_BACKGROUND;
        let canvas = Canvas::default()
            .block(Block::default().title(title.to_string()).borders(Borders::ALL))
            .marker(Marker::Braille)
            .background_color(Color::Rgb(bg_r, bg_g, bg_b))
            .x_bounds([extent.min().x, extent.max().x])
            .y_bounds([extent.min().y, extent.max().y])
            .paint(|ctx| {
                for layer in &self.layers {
                    match &layer.source {
                        LayerSource::Base => ctx.draw(&Map {
                            resolution: MapResolution::High,
                            color: Color::Gray,
                        }),
                        LayerSource::Region(features) => {
                            for feature in features {
                                self.paint_region(ctx, &feature.geometry);
                            }
                        }
                        LayerSource::Points { features, median } => {
                            for feature in features {
                                self.paint_point(ctx, feature, *median);
                            }
                        }
                    }
                    ctx.layer();
                }

                if let Some(c) = cursor {
                    ctx.print(c.x, c.y, Span::styled("+", Style::default().fg(Color::Magenta)));
                }
            });
        f.render_widget(canvas, area);
    }

    fn paint_region(&self, ctx: &mut Context, geometry: &Geometry<f64>) {
        let polygons: Vec<&Polygon<f64>> = match geometry {
            Geometry::Polygon(p) => vec![p],
            Geometry::MultiPolygon(mp) => mp.0.iter().collect(),
            _ => Vec::new(),
        };

        // 1) Rzadkie kropki w kolorze wypełnienia
        let fill = REGION_STYLE.fill.over(MAP_BACKGROUND);
        let dots = self.fill_dots(geometry);
        ctx.draw(&Points { coords: &dots, color: fill });

        // 2) Obrys zewnętrzny i dziury
        let stroke = REGION_STYLE.stroke.over(MAP_BACKGROUND);
        for poly in polygons {
            draw_ring(ctx, poly.exterior(), stroke);
            for ring in poly.interiors() {
                draw_ring(ctx, ring, stroke);
            }
        }
    }

    /// Siatka kropek co `FILL_STEP` pikseli, tylko w widocznej części obrysu.
    /// Liczba kropek zależy od rozmiaru płótna, nie od przybliżenia.
    fn fill_dots(&self, geometry: &Geometry<f64>) -> Vec<(f64, f64)> {
        let Some(bbox) = geo::BoundingRect::bounding_rect(geometry) else {
            return Vec::new();
        };
        let extent = self.view.extent();
        let (min_x, min_y) = (bbox.min().x.max(extent.min().x), bbox.min().y.max(extent.min().y));
        let (max_x, max_y) = (bbox.max().x.min(extent.max().x), bbox.max().y.min(extent.max().y));
        if min_x > max_x || min_y > max_y {
            return Vec::new();
        }

        // siatka zaczepiona w wielokrotnościach kroku, żeby kropki nie skakały przy przesuwaniu
        let step = FILL_STEP as f64 * self.view.resolution;
        let mut dots = Vec::new();
        let mut y = (min_y / step).ceil() * step;
        while y <= max_y {
            let mut x = (min_x / step).ceil() * step;
            while x <= max_x {
                if geometry.intersects(&Point::new(x, y)) {
                    dots.push((x, y));
                }
                x += step;
            }
            y += step;
        }
        dots
    }

    fn paint_point(&self, ctx: &mut Context, feature: &MapFeature, median: f64) {
        let style = PointStyle::for_value(feature.value.unwrap_or(median), median);
        let fill = style.fill.over(MAP_BACKGROUND);
        let radius = style.radius * self.view.resolution;
        let centers: Vec<(f64, f64)> = match &feature.geometry {
            Geometry::Point(p) => vec![(p.x(), p.y())],
            Geometry::MultiPoint(mp) => mp.iter().map(|p| (p.x(), p.y())).collect(),
            _ => Vec::new(),
        };
        for &(x, y) in &centers {
            ctx.draw(&Circle { x, y, radius, color: fill });
            ctx.draw(&Circle { x, y, radius: radius / 2.0, color: fill });
        }
        ctx.draw(&Points { coords: &centers, color: style.stroke.over(MAP_BACKGROUND) });
    }
}

fn draw_ring(ctx: &mut Context, ring: &LineString<f64>, color: Color) {
    for window in ring.0.windows(2) {
        let a = window[0];
        let b = window[1];
        ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color });
    }
    if let (Some(first), Some(last)) = (ring.0.first(), ring.0.last()) {
        ctx.draw(&Line { x1: last.x, y1: last.y, x2: first.x, y2: first.y, color });
    }
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry};

    fn square() -> MapFeature {
        MapFeature {
            geometry: Geometry::Polygon(polygon![
                (x: 14.0, y: 47.0), (x: 16.0, y: 47.0), (x: 16.0, y: 48.0), (x: 14.0, y: 48.0)
            ]),
            value: None,
        }
    }

    fn point(x: f64, y: f64, value: f64) -> MapFeature {
        MapFeature { geometry: Geometry::Point(Point::new(x, y)), value: Some(value) }
    }

    #[test]
    fn new_surface_has_only_base_layer() {
        let map = MapSurface::new(Coord { x: 14.1, y: 47.5 }, 7.0);
        assert_eq!(map.layers().len(), 1);
        assert!(map.layers()[0].is_base());
        assert_eq!(map.non_base_layer_count(), 0);
    }

    #[test]
    fn removing_layers_keeps_base() {
        let mut map = MapSurface::new(Coord { x: 14.1, y: 47.5 }, 7.0);
        map.add_layer("region", LayerSource::Region(vec![square()]));
        map.add_layer("points", LayerSource::Points { features: vec![], median: 0.0 });
        map.add_layer("stray", LayerSource::Region(vec![]));
        map.remove_non_base_layers();
        assert_eq!(map.layers().len(), 1);
        assert_eq!(map.layers()[0].name, BASE_LAYER);
    }

    #[test]
    fn fit_applies_pixel_padding() {
        let mut view = View { center: Coord { x: 0.0, y: 0.0 }, resolution: 1.0, width: 240.0, height: 140.0 };
        view.fit(Rect::new(Coord { x: 10.0, y: 40.0 }, Coord { x: 30.0, y: 50.0 }), 20.0);
        assert_eq!(view.center, Coord { x: 20.0, y: 45.0 });
        // 20 / (240 - 40) = 0.1, 10 / (140 - 40) = 0.1
        assert!((view.resolution - 0.1).abs() < 1e-12);

        let extent = view.extent();
        let (px, _) = view.to_pixel(Coord { x: 10.0, y: 45.0 });
        assert!((px - 20.0).abs() < 1e-9);
        assert!(extent.min().x < 10.0 && extent.max().x > 30.0);
    }

    #[test]
    fn fit_to_single_point_keeps_resolution() {
        let mut view = View { center: Coord { x: 0.0, y: 0.0 }, resolution: 0.5, width: 100.0, height: 100.0 };
        let c = Coord { x: 3.0, y: 4.0 };
        view.fit(Rect::new(c, c), 20.0);
        assert_eq!(view.resolution, 0.5);
        assert_eq!(view.center, c);
    }

    #[test]
    fn pixel_round_trip() {
        let view = View { center: Coord { x: 14.0, y: 47.0 }, resolution: 0.01, width: 200.0, height: 100.0 };
        let c = view.to_map(150.0, 25.0);
        assert!((c.x - 14.5).abs() < 1e-9);
        assert!((c.y - 47.25).abs() < 1e-9);
        let (px, py) = view.to_pixel(c);
        assert!((px - 150.0).abs() < 1e-9 && (py - 25.0).abs() < 1e-9);
    }

    #[test]
    fn hit_test_prefers_points_over_region() {
        let mut map = MapSurface::new(Coord { x: 15.0, y: 47.5 }, 7.0);
        let region = map.add_layer("region", LayerSource::Region(vec![square()]));
        let points = map.add_layer(
            "points",
            LayerSource::Points { features: vec![point(15.0, 47.5, 4.0)], median: 4.0 },
        );
        let scope = [region, points];

        let hit = map.hit_test(Coord { x: 15.0, y: 47.5 }, &scope).unwrap();
        assert_eq!(hit.value, Some(4.0));

        let hit = map.hit_test(Coord { x: 14.2, y: 47.2 }, &scope).unwrap();
        assert_eq!(hit.value, None);

        assert!(map.hit_test(Coord { x: 10.0, y: 10.0 }, &scope).is_none());
        assert!(map.hit_test(Coord { x: 15.0, y: 47.5 }, &[]).is_none());
    }

    #[test]
    fn fill_is_limited_to_visible_extent() {
        let mut map = MapSurface::new(Coord { x: 15.0, y: 47.5 }, 7.0);
        map.set_canvas_size(176.0, 172.0);
        map.fit(Rect::new(Coord { x: 14.0, y: 47.0 }, Coord { x: 16.0, y: 48.0 }), 20.0);
        let geometry = square().geometry;
        let budget = (176 / FILL_STEP + 2) * (172 / FILL_STEP + 2);
        assert!(!map.fill_dots(&geometry).is_empty());

        for _ in 0..40 {
            map.zoom_by(1.5);
            let dots = map.fill_dots(&geometry);
            assert!(dots.len() <= budget, "{} dots after zooming in", dots.len());
        }
        assert_eq!(map.view().resolution, MIN_RESOLUTION);
        // widok w środku kwadratu: całe płótno wypełnione
        assert!(!map.fill_dots(&geometry).is_empty());

        map.pan(1.0e9, 0.0);
        assert!(map.fill_dots(&geometry).is_empty());
    }

    #[test]
    fn select_requires_interaction() {
        let mut map = MapSurface::new(Coord { x: 15.0, y: 47.5 }, 7.0);
        let region = map.add_layer("region", LayerSource::Region(vec![square()]));
        let (cx, cy) = (map.view().width / 2.0, map.view().height / 2.0);
        assert!(map.select_at(cx, cy).is_none());

        let id = map.add_interaction(vec![region]);
        let event = map.select_at(cx, cy).unwrap();
        assert_eq!(event.coordinate, Coord { x: 15.0, y: 47.5 });

        assert!(map.remove_interaction(id));
        assert!(!map.remove_interaction(id));
        assert_eq!(map.interaction_count(), 0);
    }
}
