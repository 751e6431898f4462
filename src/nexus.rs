use anyhow::{bail, ensure, Result};

use crate::matrix::Taxon;

/// Minimum gap between the longest taxon name and its character string in
/// the matrix block.
const NAME_GUTTER: usize = 4;

/// MrBayes run parameters embedded in the generated command block.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// MCMC generations.
    pub ngen: u64,
    /// Filename stem MrBayes uses for its run output files.
    pub run_name: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            ngen: 1_000_000,
            run_name: "analysis".to_string(),
        }
    }
}

impl AnalysisSettings {
    // Sampling and diagnostics frequencies derive from ngen, rounded to the
    // nearest generation.
    fn sample_freq(&self) -> u64 {
        freq(self.ngen, 0.05)
    }

    fn print_freq(&self) -> u64 {
        freq(self.ngen, 0.05)
    }

    fn diagn_freq(&self) -> u64 {
        freq(self.ngen, 0.125)
    }
}

fn freq(ngen: u64, fraction: f64) -> u64 {
    (ngen as f64 * fraction).round() as u64
}

/// Render the complete NEXUS document: the DATA block with the aligned
/// character matrix, then the MrBayes block (relaxed clock, tip-dating
/// calibrations, MCMC settings).
pub fn render(taxa: &[Taxon], settings: &AnalysisSettings) -> Result<String> {
    ensure!(!taxa.is_empty(), "no taxa to write: the matrix would be empty");
    let nchars = taxa[0].nchars;
    if let Some(taxon) = taxa.iter().find(|t| t.nchars != nchars) {
        bail!(
            "taxon {} has {} characters where {} were expected",
            taxon.name,
            taxon.nchars,
            nchars
        );
    }

    let mut doc = String::new();
    doc.push_str("#NEXUS\n\nBEGIN DATA;\n");
    doc.push_str(&format!(
        "    DIMENSIONS NTAX={} NCHAR={};\n",
        taxa.len(),
        nchars
    ));
    doc.push_str("    FORMAT Datatype=Standard Symbols=\"0123456\" Missing=? Gap=-;\n");
    push_matrix(&mut doc, taxa);
    push_mrbayes(&mut doc, taxa, settings);
    Ok(doc)
}

/// One line per taxon, names padded so every charset starts at the same
/// column.
fn push_matrix(doc: &mut String, taxa: &[Taxon]) {
    let widest = taxa
        .iter()
        .map(|t| t.name.chars().count())
        .max()
        .unwrap_or(0);

    doc.push_str("MATRIX\n");
    for taxon in taxa {
        let padding = NAME_GUTTER + widest - taxon.name.chars().count();
        doc.push_str(&format!(
            "    {}{}{}\n",
            taxon.name,
            " ".repeat(padding),
            taxon.charset
        ));
    }
    doc.push_str("    ;\nEND;\n\n");
}

fn push_mrbayes(doc: &mut String, taxa: &[Taxon], settings: &AnalysisSettings) {
    doc.push_str("BEGIN MrBayes;\n");
    doc.push_str("    [relaxed clock model]\n    prset clockvarpr = igr;\n    prset igrvarpr = exp(10);\n\n");

    doc.push_str("    [tip dating]\n    calibrate\n");
    for taxon in taxa {
        doc.push_str(&format!(
            "        {} = unif({}, {})\n",
            taxon.name, taxon.lad, taxon.fad
        ));
    }
    doc.push_str("    ;\n    prset nodeagepr = calibrated;\n\n");

    doc.push_str("    [mcmc settings]\n");
    doc.push_str(&format!(
        "    mcmcp ngen = {} samplefr = {} printfr = {} diagnfr = {};\n",
        settings.ngen,
        settings.sample_freq(),
        settings.print_freq(),
        settings.diagn_freq()
    ));
    doc.push_str(&format!(
        "    mcmcp filename = \"{}\";\n\n",
        settings.run_name
    ));

    doc.push_str("    mcmc;\n    sumt;\n    sump;\nEND;\n");
}

// ── Tests ──
