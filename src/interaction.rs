use log::debug;

use crate::coord::to_string_hdms;
use crate::map_draw::{InteractionId, LayerId, MapSurface, SelectEvent};
use crate::popup::{PopupContent, PopupState};
use crate::session::RegionSession;
use crate::style::PointBucket;

/// Podpięta interakcja wyboru; należy do jednej generacji warstw
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
    id: InteractionId,
    pub generation: u64,
}

/// Zamienia kliknięcia w obiekty mapy na treść dymka
#[derive(Debug, Default)]
pub struct InteractionController {
    subscription: Option<Subscription>,
    generation: u64,
    popup: PopupState,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn popup(&self) -> &PopupState {
        &self.popup
    }

    #[cfg(test)]
    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription
    }

    /// Odpina starą interakcję i podpina nową dla świeżo dodanych warstw
    pub fn rebind(&mut self, map: &mut MapSurface, layers: Vec<LayerId>) {
        self.dispose(map);
        self.generation += 1;
        let id = map.add_interaction(layers);
        self.subscription = Some(Subscription { id, generation: self.generation });
        debug!("select interaction bound to layer generation {}", self.generation);
    }

    pub fn dispose(&mut self, map: &mut MapSurface) {
        if let Some(sub) = self.subscription.take() {
            debug!("select interaction of layer generation {} removed", sub.generation);
            map.remove_interaction(sub.id);
        }
    }

    /// Kliknięcie w piksel płótna. Zwraca true, gdy trafiono w obiekt.
    pub fn click(&mut self, map: &MapSurface, px: f64, py: f64, session: Option<&RegionSession>) -> bool {
        match map.select_at(px, py) {
            Some(event) => {
                self.handle_select(&event, session);
                true
            }
            None => false,
        }
    }

    pub fn handle_select(&mut self, event: &SelectEvent, session: Option<&RegionSession>) {
        let Some(session) = session else {
            return;
        };
        let name = session.name.clone();

        let content = match event.feature.value {
            None => PopupContent::Region { name, summary: session.summary },
            Some(value) => PopupContent::Point {
                name,
                position: to_string_hdms(event.coordinate),
                value,
                bucket: PointBucket::classify(value, session.summary.med),
            },
        };
        self.popup.show(event.coordinate, content);
    }

    pub fn close_popup(&mut self) {
        self.popup.close();
    }
}
