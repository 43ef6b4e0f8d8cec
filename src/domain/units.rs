// Glucose unit conversion for display

/// mg/dL per mmol/L for glucose
pub const MG_DL_PER_MMOL_L: f64 = 18.0;

pub fn mg_dl_to_mmol_l(mg_dl: f64) -> f64 {
    mg_dl / MG_DL_PER_MMOL_L
}

/// Format a mg/dL value as mmol/L with one decimal place
pub fn format_mmol_l(mg_dl: f64) -> String {
    format!("{:.1}", mg_dl_to_mmol_l(mg_dl))
}
