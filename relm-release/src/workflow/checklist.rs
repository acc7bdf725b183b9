//! Reminders shown between wizard steps
//!
//! Most of a release happens outside this tool (DISCO uploads, designers,
//! newsletters). These lists are what staff must have done before a step can
//! produce correct output.

use crate::models::WizardStep;

/// Checklist shown before `step` runs, if it has one
pub fn before_step(step: WizardStep) -> Option<&'static [&'static str]> {
    let items: &'static [&'static str] = match step {
        WizardStep::Structure => &[
            "All files in <pending>/<album>/_MASTERED are present and named 'IMG000 - Album - 01 Track.aif'",
            "Album description, track descriptions, album style and release date are agreed",
            "The cover from the designer is in <covers>/<CODE> <Album>",
            "The YouTube preview is uploaded and its link is at hand",
            "All mastered tracks are uploaded to DISCO",
            "Keywords and Instrumentation are filled in for every track",
        ],
        WizardStep::Metadata => &[
            "Release date",
            "Album description",
            "Album style",
            "Track descriptions",
            "Keywords",
            "Instrumentation",
        ],
        WizardStep::Harvest => &[
            "TOTAL METADATA is correct: ISRC codes continue from the previous album, no shifted columns or large gaps",
            "The remaining metadata from the sheet is entered into the tracks on DISCO",
            "A DISCO playlist is created and its link is at hand",
            "The playlist is downloaded into the AIFF and MP3 album folders",
            "Everything this tool created (album folder, stems, metadata) is uploaded to the shared drive",
            "The playlist link is sent and the team is told the album is on DISCO",
        ],
        WizardStep::Social => &[
            "The YouTube preview is uploaded and you have its link",
            "The album is fully set up on DISCO and ready to publish",
            "The album is published on DISCO and you have its public link",
        ],
        WizardStep::Finished => &[
            "Publish all social media posts",
            "Send the newsletter",
            "Register the tracks with the performing rights society",
            "Upload the tracks to Harvest",
            "Tell yourself you did a great job",
        ],
        _ => return None,
    };
    Some(items)
}

/// Numbered checklist text
pub fn render(items: &[&str]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
