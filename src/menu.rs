use ratatui::widgets::ListState;

use crate::config::RegionEntry;

const NOTHING_SELECTED: &str = "Select Region";

/// Menu wyboru regionu: etykieta bieżącego wyboru + rozwijana lista
pub struct MenuController {
    entries: Vec<RegionEntry>,
    pub cursor: usize,
    visible: bool,
    label: String,
    /// Przewinięcie listy z ostatniego rysowania
    list_state: ListState,
}

impl MenuController {
    pub fn new(entries: Vec<RegionEntry>) -> Self {
        Self {
            entries,
            cursor: 0,
            visible: false,
            label: NOTHING_SELECTED.to_string(),
            list_state: ListState::default(),
        }
    }

    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Stan listy do rysowania, z zaznaczeniem pod kursorem
    pub fn list_state(&mut self) -> &mut ListState {
        self.list_state.select(Some(self.cursor));
        &mut self.list_state
    }

    /// Pozycja listy widoczna w danym wierszu (od 0, bez ramki)
    pub fn entry_at_row(&self, row: usize) -> Option<usize> {
        let index = self.list_state.offset() + row;
        (index < self.entries.len()).then_some(index)
    }

    /// Etykieta dla regionu, który jest na mapie (albo brak wyboru)
    pub fn show_selected(&mut self, name: Option<&str>) {
        self.label = match name {
            Some(name) => format!("Selected Region: {name}"),
            None => NOTHING_SELECTED.to_string(),
        };
    }

    /// Kliknięcie w etykietę: pokaż, jeśli ukryte, ukryj, jeśli widoczne
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
    }

    /// Po wybraniu pozycji lista się chowa, a etykieta pokazuje nazwę
    pub fn choose(&mut self, index: usize) -> Option<RegionEntry> {
        let entry = self.entries.get(index)?.clone();
        self.cursor = index;
        self.visible = false;
        self.show_selected(Some(&entry.name));
        Some(entry)
    }
}
