use std::sync::Arc;

use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use geo::Coord;
use ratatui::layout::{Position, Rect};

use crate::{
    config::RegionEntry,
    loader::{RegionLoader, RegionScene},
    map_draw::MapSurface,
    menu::MenuController,
    transport::Transport,
};

/// Środek Austrii, widok startowy
pub const START_CENTER: Coord<f64> = Coord { x: 14.10, y: 47.5 };
pub const START_ZOOM: f64 = 7.0;

/// Krok przesuwania mapy i kursora, w pikselach płótna
const PAN_STEP: f64 = 16.0;
const CURSOR_STEP: f64 = 2.0;

/// Obszary ekranu z ostatniego rysowania, do obsługi myszy
#[derive(Clone, Copy, Debug, Default)]
pub struct ScreenAreas {
    pub label: Rect,
    pub list: Option<Rect>,
    pub map: Rect,
    pub popup: Option<Rect>,
}

pub struct AppState {
    pub menu: MenuController,
    pub loader: RegionLoader,
    pub scene: RegionScene,
    pub status: String,
    /// Kursor mapy w pikselach płótna
    pub cursor: (f64, f64),
    pub areas: ScreenAreas,
}

impl AppState {
    pub const HELP_TEXT: &'static str = "\
m / Tab: region menu
↑/↓ + Enter: choose region
h/j/k/l: pan, +/-: zoom
w/a/s/d: cursor, Space: select
Esc: close popup, q: quit";

    pub fn new(regions: Vec<RegionEntry>, transport: Arc<dyn Transport>) -> Self {
        let map = MapSurface::new(START_CENTER, START_ZOOM);
        let cursor = (map.view().width / 2.0, map.view().height / 2.0);
        Self {
            menu: MenuController::new(regions),
            loader: RegionLoader::new(transport),
            scene: RegionScene::new(map),
            status: String::new(),
            cursor,
            areas: ScreenAreas::default(),
        }
    }

    /// Klik w pozycję menu: zamknij dymek, pobierz region, schowaj listę
    pub fn activate_region(&mut self, index: usize) {
        let Some(entry) = self.menu.entries().get(index).cloned() else {
            return;
        };
        self.scene.interaction.close_popup();
        self.loader.request(&entry.gid, &entry.name);
        self.menu.choose(index);
        self.status = format!("Loading {}…", entry.name);
    }

    /// Odbiera zakończone pobrania; wywoływane co obrót pętli
    pub fn tick(&mut self) {
        for outcome in self.loader.poll() {
            let name = outcome.request.name.clone();
            let pending = self.loader.in_flight();
            match self.scene.apply(outcome) {
                Ok(()) if pending > 0 => self.status = format!("Loading… ({pending} pending)"),
                Ok(()) => self.status.clear(),
                Err(e) => {
                    self.status = format!("Could not load {name}: {e}");
                    if pending == 0 {
                        // etykieta wraca do regionu, który faktycznie jest na mapie
                        let shown = self.scene.session.as_ref().map(|s| s.name.as_str());
                        self.menu.show_selected(shown);
                    }
                }
            }
        }
    }

    /// Kliknięcie w piksel płótna mapy
    pub fn click_map(&mut self, px: f64, py: f64) {
        let session = self.scene.session.as_ref();
        self.scene.interaction.click(&self.scene.map, px, py, session);
    }

    fn move_cursor(&mut self, dx: f64, dy: f64) {
        let view = self.scene.map.view();
        self.cursor.0 = (self.cursor.0 + dx).clamp(0.0, view.width);
        self.cursor.1 = (self.cursor.1 + dy).clamp(0.0, view.height);
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        if self.menu.is_visible() {
            match key {
                Up => {
                    self.menu.up();
                    return false;
                }
                Down => {
                    self.menu.down();
                    return false;
                }
                Enter => {
                    self.activate_region(self.menu.cursor);
                    return false;
                }
                _ => {}
            }
        }

        match key {
            Char('q') => return true,
            Char('m') | Tab => self.menu.toggle(),
            Esc | Char('x') => self.scene.interaction.close_popup(),
            Char('h') | Left => self.scene.map.pan(-PAN_STEP, 0.0),
            Char('l') | Right => self.scene.map.pan(PAN_STEP, 0.0),
            Char('k') | Up => self.scene.map.pan(0.0, -PAN_STEP),
            Char('j') | Down => self.scene.map.pan(0.0, PAN_STEP),
            Char('+') | Char('=') => self.scene.map.zoom_by(1.5),
            Char('-') => self.scene.map.zoom_by(1.0 / 1.5),
            Char('w') => self.move_cursor(0.0, -CURSOR_STEP * 2.0),
            Char('s') => self.move_cursor(0.0, CURSOR_STEP * 2.0),
            Char('a') => self.move_cursor(-CURSOR_STEP, 0.0),
            Char('d') => self.move_cursor(CURSOR_STEP, 0.0),
            Char(' ') | Enter => {
                let (px, py) = self.cursor;
                self.click_map(px, py);
            }
            _ => {}
        }
        false
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if event.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let pos = Position { x: event.column, y: event.row };
        let areas = self.areas;

        let on_popup = areas.popup.is_some_and(|r| r.contains(pos));
        if on_popup && self.scene.interaction.popup().is_visible() {
            self.scene.interaction.close_popup();
        } else if areas.label.contains(pos) {
            self.menu.toggle();
        } else if let Some(list) = areas.list.filter(|r| r.contains(pos)) {
            // ramka zajmuje pierwszy i ostatni wiersz
            if pos.y > list.y && pos.y + 1 < list.bottom() {
                let row = usize::from(pos.y - list.y - 1);
                if let Some(index) = self.menu.entry_at_row(row) {
                    self.activate_region(index);
                }
            }
        } else if areas.map.contains(pos) {
            let px = f64::from(pos.x - areas.map.x) * 2.0 + 1.0;
            let py = f64::from(pos.y - areas.map.y) * 4.0 + 2.0;
            self.cursor = (px, py);
            self.click_map(px, py);
        }
    }

    pub fn cursor_coord(&self) -> Coord<f64> {
        self.scene.map.view().to_map(self.cursor.0, self.cursor.1)
    }
}
