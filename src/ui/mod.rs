/// egui rendering: toolbar, side and results panels, and the spectral plot.
pub mod panels;
pub mod plot;
