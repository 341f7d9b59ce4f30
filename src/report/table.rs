use crate::derive::{DerivedRow, DerivedTable, Summary};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub description: &'static str,
}

const fn column(name: &'static str, description: &'static str) -> Column {
    Column { name, description }
}

pub const COLUMNS: [Column; 36] = [
    column("el", "element number"),
    column("ip", "integration point"),
    column("cycEM", "maximum principal cyclic mean strain"),
    column("cycEA", "absolute maximum principal cyclic strain amplitude"),
    column("cycTau", "cyclic maximum shear strain"),
    column("cycSM", "maximum principal cyclic mean stress"),
    column("cycSA", "absolute maximum principal cyclic stress amplitude"),
    column("preE", "pre-strain (strain conditioning, e.g. strain during crimping)"),
    column("preS", "pre-stress (stress conditioning, e.g. stress during crimping)"),
    column("preP", "hydrostatic pressure during pre-conditioning (compression positive, tension negative)"),
    column("preM", "volume fraction martensite during pre-conditioning"),
    column("preV", "integration point volume during pre-conditioning"),
    column("ldE", "maximum principal strain during loading frame of fatigue cycle"),
    column("ldTau", "maximum shear strain during loading frame of fatigue cycle"),
    column("ldS", "maximum principal stress during loading frame of fatigue cycle"),
    column("ldP", "hydrostatic pressure during loading frame of fatigue cycle"),
    column("ldM", "volume fraction martensite during loading frame of fatigue cycle"),
    column("ldV", "integration point volume during loading frame of fatigue cycle"),
    column("ulE", "maximum principal strain during unloading frame of fatigue cycle"),
    column("ulTau", "maximum shear strain during unloading frame of fatigue cycle"),
    column("ulS", "maximum principal stress during unloading frame of fatigue cycle"),
    column("ulP", "hydrostatic pressure during unloading frame of fatigue cycle"),
    column("ulM", "volume fraction martensite during unloading frame of fatigue cycle"),
    column("ulV", "integration point volume during unloading frame of fatigue cycle"),
    column("ldS11", "loading stress in material 1 direction (r)"),
    column("ldS22", "loading stress in material 2 direction (theta)"),
    column("ldS33", "loading stress in material 3 direction (Z)"),
    column("ulS11", "unloading stress in material 1 direction (r)"),
    column("ulS22", "unloading stress in material 2 direction (theta)"),
    column("ulS33", "unloading stress in material 3 direction (Z)"),
    column("ldE11", "loading strain in material 1 direction (r)"),
    column("ldE22", "loading strain in material 2 direction (theta)"),
    column("ldE33", "loading strain in material 3 direction (Z)"),
    column("ulE11", "unloading strain in material 1 direction (r)"),
    column("ulE22", "unloading strain in material 2 direction (theta)"),
    column("ulE33", "unloading strain in material 3 direction (Z)"),
];

pub const DELIMITER: &str = ", ";

const TITLE: &str = "Results from ivol";

fn separator() -> String {
    "-".repeat(95)
}

/// Shortest representation that parses back to the same value, switching
/// to exponent notation for very small or very large magnitudes.
pub fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let magnitude = value.abs();
    if (1e-4..1e16).contains(&magnitude) {
        format!("{}", value)
    } else {
        format!("{:E}", value)
    }
}

/// The labeled block at the top of the file, also echoed to the terminal
pub fn summary_block(primary: &str, conditioning: &str, summary: &Summary) -> String {
    let lines = [
        ("Output database:", "odb", primary.to_string()),
        ("Pre-conditioning output database:", "oldOdb", conditioning.to_string()),
        ("Number of integration points:", "nRows", summary.n_rows.to_string()),
        ("Total volume:", "vTotal", format_general(summary.v_total)),
        ("Maximum mean strain:", "cycEMmax", format_general(summary.cyc_em_max)),
        ("Maximum strain amplitude (abs):", "cycEAmax", format_general(summary.cyc_ea_max)),
    ];

    let mut block = String::new();
    block.push_str(TITLE);
    block.push('\n');
    block.push_str(&"=".repeat(TITLE.len()));
    block.push('\n');
    for (label, key, value) in lines {
        block.push_str(&format!("{:<40}{:<9}= {}\n", label, key, value));
    }
    block
}

pub fn header_line() -> String {
    COLUMNS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

pub fn row_line(row: &DerivedRow) -> String {
    let mut fields = Vec::with_capacity(COLUMNS.len());
    fields.push(row.element_label.to_string());
    fields.push(row.integration_point.to_string());
    fields.extend(row.values().iter().map(|&v| format_general(v)));
    fields.join(DELIMITER)
}

/// Writes the summary, legend, header and data lines of a derived table
pub struct TableWriter<W: Write> {
    writer: W,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_summary(&mut self, primary: &str, conditioning: &str, summary: &Summary) -> io::Result<()> {
        self.writer
            .write_all(summary_block(primary, conditioning, summary).as_bytes())
    }

    pub fn write_legend(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", separator())?;
        for column in &COLUMNS {
            writeln!(self.writer, "{:<7}= {}", column.name, column.description)?;
        }
        writeln!(self.writer, "{}", separator())
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", header_line())
    }

    pub fn write_row(&mut self, row: &DerivedRow) -> io::Result<()> {
        writeln!(self.writer, "{}", row_line(row))
    }

    pub fn write_table(
        &mut self,
        primary: &str,
        conditioning: &str,
        table: &DerivedTable,
        progress_callback: Option<&dyn Fn(usize)>,
    ) -> io::Result<()> {
        self.write_summary(primary, conditioning, &table.summary)?;
        self.write_legend()?;
        self.write_header()?;

        for (i, row) in table.rows.iter().enumerate() {
            self.write_row(row)?;
            if let Some(callback) = progress_callback {
                callback(i + 1);
            }
        }

        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
