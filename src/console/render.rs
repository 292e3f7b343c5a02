use colored::*;

use crate::types::{EvaluationJob, EvaluationReport, JobStatus};

pub fn display_submitted(job: &EvaluationJob) {
    println!(
        "{} {}",
        "📨 Job submitted:".bright_green().bold(),
        job.id.bright_white()
    );
    println!(
        "{} pitch_coach status {}",
        "ℹ️  Poll with:".blue(),
        job.id.white()
    );
}

pub fn display_job(job: &EvaluationJob) {
    println!("\n{}", "🗂️  Evaluation Job".bright_yellow().bold());
    println!(
        "{}",
        "┌─────────────────────────────────────────────────────────────".yellow()
    );
    println!("{} {}", "│ 🆔 Job ID:".yellow(), job.id.bright_white());
    let status_str = job.status.to_string();
    let status_colored = match job.status {
        JobStatus::Queued => status_str.bright_blue().bold(),
        JobStatus::Running => status_str.bright_yellow().bold(),
        JobStatus::Completed => status_str.bright_green().bold(),
        JobStatus::Failed => status_str.bright_red().bold(),
    };
    println!("{} {}", "│ 🚦 Status:".yellow(), status_colored);
    println!(
        "{} {}",
        "│ 🎯 Target:".yellow(),
        job.target.to_string().white()
    );
    println!(
        "{} {}",
        "│ 🗓️  Created:".yellow(),
        job.created_at.to_rfc3339().white()
    );
    println!(
        "{} {}",
        "│ 🗓️  Updated:".yellow(),
        job.updated_at.to_rfc3339().white()
    );
    if let Some(media) = &job.media {
        println!("{} {}", "│ 📎 Attachments:".yellow(), media.len());
        for item in media {
            println!("│   {} ({} bytes)", item.file_name.white(), item.size_bytes);
        }
    }
    if let Some(error) = &job.error {
        println!("{} {}", "│ ❌ Error:".yellow(), error.bright_red());
    }
    println!(
        "{}",
        "└─────────────────────────────────────────────────────────────\n".yellow()
    );
}

pub fn display_report(report: &EvaluationReport) {
    println!("\n{}", "📋 Evaluation Report".bright_cyan().bold());
    println!(
        "{}",
        "┌─────────────────────────────────────────────────────────────".cyan()
    );
    let score = format!("{:.1}", report.summary.overall_score);
    let score_colored = if report.summary.overall_score >= 70.0 {
        score.bright_green().bold()
    } else if report.summary.overall_score >= 40.0 {
        score.bright_yellow().bold()
    } else {
        score.bright_red().bold()
    };
    println!("{} {} / 100", "│ 🎯 Overall Score:".cyan(), score_colored);
    println!(
        "{} {}",
        "│ 📰 Headline:".cyan(),
        report.summary.headline.bright_white()
    );

    if !report.summary.highlights.is_empty() {
        println!("{}", "│ ✨ Highlights:".cyan());
        for item in &report.summary.highlights {
            println!("│   • {}", item.white());
        }
    }
    if !report.summary.risks.is_empty() {
        println!("{}", "│ ⚠️  Risks:".cyan());
        for item in &report.summary.risks {
            println!("│   • {}", item.white());
        }
    }

    if let Some(deck) = &report.pitch_deck {
        println!(
            "{} score {:.1}",
            "│ 🖼️  Deck critique:".cyan(),
            deck.score
        );
    }
    if let Some(delivery) = &report.delivery {
        println!(
            "{} score {:.1}",
            "│ 🗣️  Delivery critique:".cyan(),
            delivery.score
        );
    }
    if let Some(audio) = &report.audio {
        println!(
            "{} score {:.1}",
            "│ 🔊 Audio critique:".cyan(),
            audio.score
        );
    }

    if let Some(timeline) = &report.timeline {
        println!("{}", "│ ⏱️  Timeline:".cyan());
        for event in timeline {
            println!(
                "│   {} ({:.1}) — {}",
                event.label.bright_white(),
                event.score,
                event.note.white()
            );
        }
    }

    if !report.recommendations.is_empty() {
        println!("{}", "│ ✅ Recommendations:".cyan());
        for rec in &report.recommendations {
            println!(
                "│   {}. [{}] {}",
                rec.priority,
                rec.area.bright_white(),
                rec.action.white()
            );
        }
    }

    if let Some(warnings) = &report.warnings {
        println!("{}", "│ ⚠️  Warnings:".cyan());
        for warning in warnings {
            println!("│   • {}", warning.bright_yellow());
        }
    }

    println!(
        "{} {} ({})",
        "│ 🤖 Model:".cyan(),
        report.meta.model.white(),
        report.meta.generated_at.white()
    );
    println!(
        "{}",
        "└─────────────────────────────────────────────────────────────\n".cyan()
    );
}
