// src/content.rs

//! Built-in practice material: sample texts admins can start a lesson from
//! and the fixed placement passage.

use crate::models::{lesson::ModuleType, level::LessonLevel};

const BEGINNER_TEXTS: &[&str] = &[
    "Good patient care starts with clear notes. Write what you see and check it twice before you sign.",
    "Take the pulse at the wrist and count for a full minute. Record the number and the time.",
    "Wash your hands before and after every patient. Clean hands stop the spread of germs.",
    "Ask the patient to state their name and date of birth before giving any medicine.",
    "A calm voice helps a worried patient. Explain each step before you begin.",
];

const INTERMEDIATE_TEXTS: &[&str] = &[
    "The respiratory system moves oxygen into the blood and carries carbon dioxide out. Watch the rate, depth, and rhythm of each breath when you assess a patient.",
    "Chronic kidney disease often develops without early symptoms. Routine blood work that tracks creatinine and filtration rate helps detect decline before it becomes severe.",
    "Sterile technique protects open wounds during dressing changes. Prepare the field, open supplies without touching their inner surfaces, and replace gloves if they are contaminated.",
    "A pain assessment records location, intensity, character, and duration. Reassess after every intervention so the care plan reflects how the patient actually responds.",
    "Fluid balance charts compare intake with output over a shift. A steady positive balance may signal retention, while a negative trend can point to dehydration.",
];

const ADVANCED_TEXTS: &[&str] = &[
    "Anticoagulation therapy demands careful titration. Warfarin dosing is guided by the international normalized ratio, and interacting drugs or dietary vitamin K can shift the therapeutic window within days.",
    "Acute respiratory distress syndrome causes diffuse alveolar injury and refractory hypoxemia. Lung-protective ventilation with low tidal volumes and adequate positive end-expiratory pressure reduces further barotrauma.",
    "Diabetic ketoacidosis combines hyperglycemia, ketonemia, and metabolic acidosis. Management prioritizes fluid resuscitation, continuous insulin infusion, and close monitoring of serum potassium during correction.",
    "Interpreting arterial blood gases requires evaluating pH, partial pressure of carbon dioxide, and bicarbonate together, then checking whether the expected compensation is present or a mixed disorder exists.",
    "Systematic reviews pool findings from comparable trials. Heterogeneity, publication bias, and the risk of bias in each included study all determine how much weight a pooled estimate deserves.",
];

const AUDIO_SENTENCES: &[&str] = &[
    "The patient reports sharp pain in the lower right abdomen.",
    "Give five hundred milligrams of paracetamol by mouth.",
    "Heart rate is seventy two beats per minute and regular.",
    "Schedule a chest x ray for tomorrow morning.",
    "Record the blood glucose level before each meal.",
    "The patient is allergic to latex and shellfish.",
    "Raise the head of the bed to thirty degrees.",
    "Check the intravenous site for redness or swelling.",
];

const AUDIO_PARAGRAPHS: &[&str] = &[
    "Safe handover keeps patients safe between shifts. The outgoing nurse summarizes the diagnosis, recent changes, pending tests, and any concerns. The incoming nurse repeats the key points back and asks questions before accepting responsibility for care.",
    "Preventing pressure injuries depends on regular repositioning, skin inspection, and good nutrition. Patients who cannot move on their own should be turned at set intervals, and any reddened area should be documented and reported promptly.",
    "Medication reconciliation compares what a patient takes at home with what is ordered in hospital. Differences are reviewed with the prescriber so that nothing is omitted, duplicated, or given at the wrong dose.",
];

const PLACEMENT_PASSAGE: &str = "Nurses record vital signs at the start of every shift. \
A careful note of temperature, pulse, breathing rate, and blood pressure helps the whole team \
notice changes early and respond before a patient becomes unwell.";

/// Returns a sample for the given level and module type. `index` selects
/// among the available samples and wraps around.
///
/// Audio modules ignore the level; `All` draws from the intermediate pool.
pub fn sample_text(level: LessonLevel, module_type: ModuleType, index: usize) -> &'static str {
    let pool = match module_type {
        ModuleType::AudioSentence => AUDIO_SENTENCES,
        ModuleType::AudioParagraph => AUDIO_PARAGRAPHS,
        ModuleType::Text => match level {
            LessonLevel::Beginner => BEGINNER_TEXTS,
            LessonLevel::Intermediate | LessonLevel::All => INTERMEDIATE_TEXTS,
            LessonLevel::Advanced => ADVANCED_TEXTS,
        },
    };
    pool[index % pool.len()]
}

/// The passage every student types for placement.
pub fn placement_passage() -> &'static str {
    PLACEMENT_PASSAGE
}
