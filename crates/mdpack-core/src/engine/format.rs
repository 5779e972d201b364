/// Renders a float the way Packmol input files conventionally show them: the shortest
/// representation that round-trips, with integral values keeping a trailing `.0`.
///
/// Values whose decimal exponent is below -4 or at least 16 switch to exponent form
/// with a sign and at least two exponent digits (`1e-05`, `1.5e+20`).
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() && value != 0.0 {
        let scientific = format!("{:e}", value);
        if let Some((mantissa, exponent)) = scientific.split_once('e') {
            if let Ok(exp) = exponent.parse::<i32>() {
                if !(-4..16).contains(&exp) {
                    let sign = if exp < 0 { '-' } else { '+' };
                    return format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs());
                }
            }
        }
    }

    let rendered = value.to_string();
    if value.is_finite() && !rendered.contains('.') {
        format!("{}.0", rendered)
    } else {
        rendered
    }
}
