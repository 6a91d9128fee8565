use std::sync::{
    mpsc::{self, Receiver, Sender},
    Arc,
};
use std::thread;

use log::{debug, warn};

use crate::data::RegionPayload;
use crate::interaction::InteractionController;
use crate::legend::{InfoPanel, LegendLayout};
use crate::map_draw::{LayerSource, MapSurface};
use crate::session::RegionSession;
use crate::transport::{Transport, TransportError};

/// Margines dopasowania widoku do regionu, w pikselach
pub const FIT_PADDING: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionRequest {
    pub gid: String,
    pub name: String,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub request: RegionRequest,
    pub result: Result<RegionPayload, TransportError>,
}

/// Wszystko, co zmienia wczytanie regionu
pub struct RegionScene {
    pub map: MapSurface,
    pub interaction: InteractionController,
    pub session: Option<RegionSession>,
    pub info: Option<InfoPanel>,
    pub legend: Option<LegendLayout>,
}

impl RegionScene {
    pub fn new(map: MapSurface) -> Self {
        Self {
            map,
            interaction: InteractionController::new(),
            session: None,
            info: None,
            legend: None,
        }
    }

    /// Podmienia warstwy, sesję, legendę i interakcję na dane nowego regionu
    pub fn apply_region(&mut self, request: &RegionRequest, payload: RegionPayload) {
        let extent = payload.fit_extent();
        let RegionPayload { summary, region, points } = payload;

        // 1) dymek poprzedniego regionu znika
        self.interaction.close_popup();

        // 2) sesja
        self.session = Some(RegionSession {
            gid: request.gid.clone(),
            name: request.name.clone(),
            summary,
        });

        // 3-4) warstwy: tylko baza + nowa para
        self.map.remove_non_base_layers();
        let region_layer = self.map.add_layer("region", LayerSource::Region(region));
        let points_layer = self
            .map
            .add_layer("points", LayerSource::Points { features: points, median: summary.med });

        // 5) widok
        if let Some(extent) = extent {
            self.map.fit(extent, FIT_PADDING);
        }

        // 6-7) legenda i panel informacji
        self.legend = Some(LegendLayout::new(&summary));
        self.info = Some(InfoPanel::new(&summary));

        // 8) interakcja tylko dla nowych warstw
        self.interaction.rebind(&mut self.map, vec![region_layer, points_layer]);
    }

    /// Udane wczytanie stosuje, błąd zwraca bez ruszania stanu
    pub fn apply(&mut self, outcome: LoadOutcome) -> Result<(), TransportError> {
        match outcome.result {
            Ok(payload) => {
                debug!("applying region {} ({})", outcome.request.gid, outcome.request.name);
                self.apply_region(&outcome.request, payload);
                Ok(())
            }
            Err(e) => {
                warn!("loading region {} failed: {e}", outcome.request.gid);
                Err(e)
            }
        }
    }
}

/// Pobiera regiony w tle; wyniki odbiera `poll` w wątku interfejsu
pub struct RegionLoader {
    transport: Arc<dyn Transport>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
    in_flight: usize,
}

impl RegionLoader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { transport, tx, rx, in_flight: 0 }
    }

    /// Bez anulowania: kilka zapytań naraz kończy się w dowolnej kolejności
    pub fn request(&mut self, gid: &str, name: &str) {
        let request = RegionRequest { gid: gid.to_string(), name: name.to_string() };
        debug!("requesting region {gid} ({name})");

        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let result = transport.fetch_region(&request.gid);
            // odbiorca zniknął tylko przy zamykaniu aplikacji
            let _ = tx.send(LoadOutcome { request, result });
        });
    }

    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        let outcomes: Vec<LoadOutcome> = self.rx.try_iter().collect();
        self.in_flight -= outcomes.len();
        outcomes
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[cfg(test)]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Option<LoadOutcome> {
        let outcome = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight -= 1;
        Some(outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{tests::styria_body, DataError};
    use crate::legend::TickKind;
    use geo::Coord;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Odpowiedzi z pamięci zamiast HTTP
    pub(crate) struct StubTransport {
        pub bodies: HashMap<String, Vec<u8>>,
    }

    impl Transport for StubTransport {
        fn fetch_region(&self, gid: &str) -> Result<RegionPayload, TransportError> {
            match self.bodies.get(gid) {
                Some(body) => Ok(RegionPayload::from_slice(body)?),
                None => Err(TransportError::Data(DataError::EmptyRegion)),
            }
        }
    }

    pub(crate) fn stub() -> Arc<dyn Transport> {
        let mut bodies = HashMap::new();
        bodies.insert("42".to_string(), styria_body());
        bodies.insert("13".to_string(), b"not json".to_vec());
        Arc::new(StubTransport { bodies })
    }

    fn scene() -> RegionScene {
        RegionScene::new(MapSurface::new(Coord { x: 14.10, y: 47.5 }, 7.0))
    }

    fn styria() -> RegionRequest {
        RegionRequest { gid: "42".into(), name: "Styria".into() }
    }

    #[test]
    fn styria_scenario() {
        let mut scene = scene();
        let payload = RegionPayload::from_slice(&styria_body()).unwrap();
        scene.apply_region(&styria(), payload);

        let session = scene.session.as_ref().unwrap();
        assert_eq!(session.gid, "42");
        assert_eq!(session.name, "Styria");

        let info = scene.info.as_ref().unwrap();
        assert_eq!(
            format!("{}/{}/{}/{}", info.min, info.avg, info.med, info.max),
            "1.00/5.00/4.00/9.00"
        );
        let legend = scene.legend.as_ref().unwrap();
        assert_eq!(legend.tick(TickKind::Median).unwrap().offset, 105.0);

        // widok wycentrowany na obrysie
        let center = scene.map.view().center;
        assert!((center.x - 14.85).abs() < 1e-9);
        assert!((center.y - 47.2).abs() < 1e-9);
    }

    #[test]
    fn repeated_loads_keep_one_layer_pair_and_one_interaction() {
        let mut scene = scene();
        scene.map.add_layer("leftover", LayerSource::Region(vec![]));
        for _ in 0..3 {
            let payload = RegionPayload::from_slice(&styria_body()).unwrap();
            scene.apply_region(&styria(), payload);
            assert_eq!(scene.map.non_base_layer_count(), 2);
            assert_eq!(scene.map.layers().len(), 3);
            assert_eq!(scene.map.interaction_count(), 1);
        }
    }

    #[test]
    fn load_closes_open_popup() {
        let mut scene = scene();
        scene.apply_region(&styria(), RegionPayload::from_slice(&styria_body()).unwrap());
        let (w, h) = (scene.map.view().width, scene.map.view().height);
        let session = scene.session.clone();
        assert!(scene.interaction.click(&scene.map, w / 2.0, h / 2.0, session.as_ref()));
        assert!(scene.interaction.popup().is_visible());

        scene.apply_region(&styria(), RegionPayload::from_slice(&styria_body()).unwrap());
        assert!(!scene.interaction.popup().is_visible());
    }

    #[test]
    fn failed_load_changes_nothing() {
        let mut scene = scene();
        scene.apply_region(&styria(), RegionPayload::from_slice(&styria_body()).unwrap());
        let view_before = *scene.map.view();
        let session_before = scene.session.clone();

        let outcome = LoadOutcome {
            request: RegionRequest { gid: "13".into(), name: "Carinthia".into() },
            result: Err(TransportError::Data(DataError::EmptyRegion)),
        };
        assert!(scene.apply(outcome).is_err());

        assert_eq!(scene.session, session_before);
        assert_eq!(*scene.map.view(), view_before);
        assert_eq!(scene.map.non_base_layer_count(), 2);
        assert_eq!(scene.map.interaction_count(), 1);
    }

    #[test]
    fn loader_delivers_outcomes_from_worker_threads() {
        let mut loader = RegionLoader::new(stub());
        loader.request("42", "Styria");
        loader.request("13", "Carinthia");
        assert_eq!(loader.in_flight(), 2);

        let mut outcomes = Vec::new();
        while let Some(outcome) = loader.wait(Duration::from_secs(5)) {
            outcomes.push(outcome);
            if outcomes.len() == 2 {
                break;
            }
        }
        assert_eq!(loader.in_flight(), 0);
        outcomes.sort_by(|a, b| a.request.gid.cmp(&b.request.gid));
        assert!(matches!(
            outcomes[0].result,
            Err(TransportError::Data(DataError::Json(_)))
        ));
        assert!(outcomes[1].result.is_ok());
        assert!(loader.poll().is_empty());
    }
}
