use geo::Coord;

/// Zapis stopnie/minuty/sekundy jednej osi, np. `47° 30′ 00″ N`
fn degrees_to_hdms(hemispheres: [char; 2], degrees: f64) -> String {
    let normalized = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    let x = (3600.0 * normalized).abs();

    let mut deg = (x / 3600.0).floor();
    let mut min = ((x - deg * 3600.0) / 60.0).floor();
    let mut sec = (x - deg * 3600.0 - min * 60.0).round();

    if sec >= 60.0 {
        sec = 0.0;
        min += 1.0;
    }
    if min >= 60.0 {
        min = 0.0;
        deg += 1.0;
    }

    let mut out = format!("{deg}\u{b0} {min:02}\u{2032} {sec:02}\u{2033}");
    if normalized != 0.0 {
        out.push(' ');
        out.push(if normalized < 0.0 { hemispheres[1] } else { hemispheres[0] });
    }
    out
}

/// Współrzędna (lon, lat) jako tekst: najpierw szerokość, potem długość
pub fn to_string_hdms(coord: Coord<f64>) -> String {
    format!(
        "{} {}",
        degrees_to_hdms(['N', 'S'], coord.y),
        degrees_to_hdms(['E', 'W'], coord.x)
    )
}
