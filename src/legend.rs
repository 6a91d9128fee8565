use crate::data::RegionSummary;

/// Szerokość osi legendy w pikselach
pub const AXIS_WIDTH: f64 = 280.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickKind {
    Min,
    Max,
    Average,
    Median,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendTick {
    pub kind: TickKind,
    /// Odległość od początku osi; może wyjść poza [0, width] przy złych danych
    pub offset: f64,
    pub label: String,
}

/// Model legendy: oś o stałej szerokości i znaczniki min/max/średniej/mediany
#[derive(Clone, Debug, PartialEq)]
pub struct LegendLayout {
    pub width: f64,
    pub ticks: Vec<LegendTick>,
}

impl LegendLayout {
    pub fn new(summary: &RegionSummary) -> Self {
        let width = AXIS_WIDTH;
        let mut ticks = vec![
            LegendTick { kind: TickKind::Min, offset: 0.0, label: fmt2(summary.min) },
            LegendTick { kind: TickKind::Max, offset: width, label: fmt2(summary.max) },
            // średnia zawsze w połowie osi, nie liczona z min/max
            LegendTick { kind: TickKind::Average, offset: width * 0.5, label: fmt2(summary.avg) },
        ];
        if let Some(offset) = median_offset(summary, width) {
            ticks.push(LegendTick { kind: TickKind::Median, offset, label: fmt2(summary.med) });
        }
        Self { width, ticks }
    }

    #[cfg(test)]
    pub fn tick(&self, kind: TickKind) -> Option<&LegendTick> {
        self.ticks.iter().find(|t| t.kind == kind)
    }
}

/// `width * (med - min) / (max - min)`, `None` gdy zakres jest zdegenerowany
pub fn median_offset(summary: &RegionSummary, width: f64) -> Option<f64> {
    let offset = width * (summary.med - summary.min) / (summary.max - summary.min);
    offset.is_finite().then_some(offset)
}

/// Pola panelu informacji, każde z dwoma miejscami po przecinku
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoPanel {
    pub min: String,
    pub avg: String,
    pub med: String,
    pub max: String,
}

impl InfoPanel {
    pub fn new(summary: &RegionSummary) -> Self {
        Self {
            min: fmt2(summary.min),
            avg: fmt2(summary.avg),
            med: fmt2(summary.med),
            max: fmt2(summary.max),
        }
    }
}

pub fn fmt2(v: f64) -> String {
    format!("{v:.2}")
}
