use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Unknown prompt template: {0}")]
    UnknownTemplate(String),
}

const DECK_CRITIQUE: &str = r#"
You are the deck critique agent. Assess the slide deck text below as a pitch coach: narrative arc, clarity of problem/solution, evidence, and slide economy. Output ONLY a JSON object.

Descriptions in the schema indicate expected data and type; replace them with actual values in your output.

Schema (DeckCritique):
{
  "score": "Deck quality score from 0 to 100 (number)",
  "strengths": ["What the deck does well (array of strings)"],
  "weaknesses": ["Where the deck falls short (array of strings)"],
  "suggestions": ["Concrete slide-level improvements (array of strings)"]
}

Deck text:
{{deck_text}}

Additional context from the presenter:
{{context}}
"#;

const DELIVERY_CRITIQUE: &str = r#"
You are the delivery critique agent. Assess the spoken delivery from the transcript below: structure, clarity, pacing signals, filler words, and audience engagement. Output ONLY a JSON object.

Descriptions in the schema indicate expected data and type; replace them with actual values in your output.

Schema (DeliveryCritique):
{
  "score": "Delivery quality score from 0 to 100 (number)",
  "clarity": "One-line assessment of clarity (string or null)",
  "pace": "One-line assessment of pacing (string or null)",
  "fillers": ["Filler words or verbal tics observed (array of strings)"],
  "suggestions": ["Concrete delivery improvements (array of strings)"]
}

Transcript:
{{transcript}}

Additional context from the presenter:
{{context}}
"#;

const AUDIO_CRITIQUE: &str = r#"
You are the audio critique agent. Assess the vocal performance using the transcript and the audio description below: speaking rate, energy, and anything the audio metadata suggests. Output ONLY a JSON object.

Descriptions in the schema indicate expected data and type; replace them with actual values in your output.

Schema (AudioCritique):
{
  "score": "Vocal performance score from 0 to 100 (number)",
  "paceWpm": "Estimated words per minute (number or null)",
  "energy": "One-line assessment of vocal energy (string or null)",
  "notes": ["Observations about the audio (array of strings)"]
}

Audio description:
{{audio_summary}}

Transcript:
{{transcript}}

Additional context from the presenter:
{{context}}
"#;

const COMBINE_REPORT: &str = r#"
You are the combiner agent. Merge the per-aspect critiques below (a critique is null when that aspect could not be analyzed) into one coherent coaching report for a "{{target}}" evaluation. Output ONLY a JSON object.

Descriptions in the schema indicate expected data and type; replace them with actual values in your output.

Schema (CombinedOutput):
{
  "summary": {
    "overallScore": "Overall score from 0 to 100 (number)",
    "headline": "One-sentence overall assessment (string)",
    "highlights": ["Top strengths across all aspects (array of strings)"],
    "risks": ["Top risks across all aspects (array of strings)"]
  },
  "timeline": [
    {
      "label": "Phase of the presentation, e.g. 'opening' (string)",
      "score": "Score for that phase from 0 to 100 (number)",
      "note": "What happened in that phase (string)"
    }
  ],
  "recommendations": [
    {
      "priority": "1 is most urgent (integer)",
      "area": "Aspect the advice targets: deck, delivery or audio (string)",
      "action": "Concrete next step for the presenter (string)"
    }
  ]
}

Deck critique:
{{deck_json}}

Delivery critique:
{{delivery_json}}

Audio critique:
{{audio_json}}

A transcript was available: {{transcript_present}}
"#;

fn template(name: &str) -> Option<&'static str> {
    match name {
        "deck_critique" => Some(DECK_CRITIQUE),
        "delivery_critique" => Some(DELIVERY_CRITIQUE),
        "audio_critique" => Some(AUDIO_CRITIQUE),
        "combine_report" => Some(COMBINE_REPORT),
        _ => None,
    }
}

/// Render a named template, substituting every `{{key}}` placeholder.
/// Pure and deterministic; fails only when the template name is unknown.
pub fn render(name: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
    let mut out = template(name)
        .ok_or_else(|| PromptError::UnknownTemplate(name.to_string()))?
        .to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_is_idempotent() {
        let vars = [("deck_text", "Problem: X."), ("context", "seed round")];
        let first = render("deck_critique", &vars).unwrap();
        let second = render("deck_critique", &vars).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("Problem: X."));
        assert!(first.contains("seed round"));
    }

    #[test]
    fn render_fills_every_placeholder() {
        let rendered = render(
            "combine_report",
            &[
                ("target", "full"),
                ("deck_json", "null"),
                ("delivery_json", "{}"),
                ("audio_json", "null"),
                ("transcript_present", "false"),
            ],
        )
        .unwrap();
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn unknown_template_fails() {
        let err = render("no_such_template", &[]).unwrap_err();
        assert!(err.to_string().contains("no_such_template"));
    }
}
