//! Human-readable report cards for analysis results, parsed documents and RFP output.

use chrono::Local;
use dealvelocity_core::{
    AnalysisResult, ClauseAnalysis, EvaluatorSimulation, ProposalSection, RfpRequirement, RiskBand,
};
use dealvelocity_services::ParsedDocument;

const WRAP: usize = 88;
const TEXT_PREVIEW: usize = 2_000;

// ── Public API ──

/// Print the risk report: overall score and band, then clauses riskiest first.
pub fn print_report(source: &str, result: &AnalysisResult) {
    let band = RiskBand::for_score(result.overall_risk_score);
    println!("=== Risk report: {source} ===");
    println!("Generated {}", Local::now().format("%Y-%m-%d %H:%M"));
    println!();
    println!(
        "  Overall risk  {:>3}/100  [{}] {}",
        result.overall_risk_score,
        meter(result.overall_risk_score),
        band.as_str()
    );
    println!("  Clauses       {}", result.clauses.len());
    println!("  Elapsed       {} ms", result.processing_time_ms);
    println!();

    if result.clauses.is_empty() {
        println!("  No clauses were flagged for detailed analysis.");
        return;
    }

    for (n, clause) in ranked(&result.clauses).into_iter().enumerate() {
        print_clause(n + 1, clause);
    }
}

pub fn print_document(doc: &ParsedDocument) {
    let meta = &doc.metadata;
    println!("=== {} ===", meta.filename);
    print_field("Type", &format!("{} ({})", meta.doc_type, meta.file_type));
    print_field("Pages", &meta.page_count.to_string());
    print_field("Sections", &doc.sections.len().to_string());
    if !meta.extracted_dates.is_empty() {
        print_field("Dates", &meta.extracted_dates.join(", "));
    }
    if !meta.extracted_values.is_empty() {
        print_field("Values", &meta.extracted_values.join(", "));
    }
    println!();

    let preview: String = doc.full_text.chars().take(TEXT_PREVIEW).collect();
    println!("{preview}");
    if doc.full_text.chars().count() > TEXT_PREVIEW {
        println!("... ({} chars total)", doc.full_text.chars().count());
    }
}

pub fn print_requirements(requirements: &[RfpRequirement]) {
    println!("=== {} requirements ===", requirements.len());
    for (n, req) in requirements.iter().enumerate() {
        let page = req
            .page_ref
            .map(|p| format!(" p.{p}"))
            .unwrap_or_default();
        println!();
        println!(
            "{:>3}. [{} / {}]{page}",
            n + 1,
            req.priority.as_str(),
            req.req_type.as_str()
        );
        print_wrapped("     ", &req.req_text);
    }
}

pub fn print_simulation(sim: &EvaluatorSimulation) {
    println!("=== Evaluator: {} ===", sim.evaluator_persona);
    println!(
        "  Score  {:>3}/100  [{}]",
        sim.simulated_score,
        meter(sim.simulated_score)
    );
    println!();
    println!("  Feedback");
    print_wrapped("    ", &sim.feedback);
    if !sim.improvement_suggestions.is_empty() {
        println!();
        println!("  Improvements");
        print_wrapped("    ", &sim.improvement_suggestions);
    }
}

pub fn print_section(section: &ProposalSection) {
    println!("=== {} (v{}) ===", section.section_title, section.version);
    println!();
    println!("{}", section.content);
}

// ── Formatting helpers ──

/// Clauses ordered by score, highest first; ties keep extraction order.
fn ranked(clauses: &[ClauseAnalysis]) -> Vec<&ClauseAnalysis> {
    let mut ranked: Vec<&ClauseAnalysis> = clauses.iter().collect();
    ranked.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    ranked
}

fn print_clause(n: usize, clause: &ClauseAnalysis) {
    println!(
        "--- {n}. {} | {} | {} | {}/100 ---",
        clause.clause_type,
        clause.risk_level.as_str().to_uppercase(),
        clause.risk_category.as_str(),
        clause.risk_score
    );
    print_wrapped("  > ", &clause.clause_text);
    println!();
    print_labelled("Risk", &clause.risk_description);
    print_labelled("Impact", &clause.impact_description);
    print_labelled("Why", &clause.reasoning);
    if clause.proposes_change() {
        print_labelled("Suggest", &clause.suggested_alternative);
    }
    println!();
}

fn print_field(label: &str, value: &str) {
    println!("  {label:<10} {value}");
}

fn print_labelled(label: &str, text: &str) {
    let lines = wrap(text, WRAP - 12);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {label:<9} {line}");
        } else {
            println!("  {:<9} {line}", "");
        }
    }
}

fn print_wrapped(indent: &str, text: &str) {
    for line in wrap(text, WRAP - indent.chars().count()) {
        println!("{indent}{line}");
    }
}

/// Ten-cell bar for a 0–100 score.
fn meter(score: u8) -> String {
    let filled = (usize::from(score.min(100)) + 5) / 10;
    format!("{}{}", "#".repeat(filled), ".".repeat(10 - filled))
}

/// Greedy word wrap; words longer than `width` get a line to themselves.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}
