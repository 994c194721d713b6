//! Prompt templates for multiple-choice question generation.
//!
//! Every template carries exactly one `{text}` placeholder that receives a
//! segment's content. The pipeline does not care which variant is active.
//!
//! Callers can supply their own wording through
//! [`PromptTemplate::new`], which enforces the single-placeholder rule.

use crate::error::QuizGenError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The substitution point every template must contain exactly once.
pub const PLACEHOLDER: &str = "{text}";

/// Open guidance: four similar-length options, detailed explanations.
pub const REFLECTIVE_PROMPT: &str = r#"Genera una domanda a scelta multipla basata sul seguente testo:

{text}

Riferisciti al testo come unità didattica. La domanda deve avere 4 opzioni di risposta, la cui lunghezza deve essere molto simile, una delle quali è corretta. Ogni opzione deve essere plausibile e coerente con il contenuto dell'Unità didattica.

L'obiettivo principale è far riflettere gli studenti su concetti chiave dell'Unità didattica, stimolando la loro capacità di analizzare e applicare tali concetti in situazioni reali.

Per ogni risposta, sia giusta che errata, fornisci una spiegazione dettagliata seguendo queste indicazioni:

- Le opzioni di risposta (inclusi i distrattori) devono essere formulate in modo plausibile, evitando banalità. I distrattori devono essere basati su potenziali errori concettuali che uno studente avanzato potrebbe commettere, ma che portino a riflettere sui concetti fondamentali del testo.
- Non utilizzare frasi come "il testo non menziona", ma fornisci una spiegazione plausibile legata al contesto dell'Unità didattica.
- La spiegazione della risposta corretta deve essere esauriente, chiara e direttamente collegata al concetto chiave trattato nell'Unità didattica.
- Mantieni un linguaggio formale e preciso, ma chiaro, adeguato per studenti di livello avanzato, come quelli di un master. Evita tecnicismi eccessivi, a meno che non siano essenziali per la comprensione del concetto trattato."#;

/// Fixed layout: question, a)–d) answers, analysis of correct answer and distractors.
pub const STRUCTURED_PROMPT: &str = r#"Genera una domanda a scelta multipla basata sul seguente testo {text}, che viene trattato come un’unità didattica. La domanda deve avere le seguenti caratteristiche:

Formulata chiaramente e in modo da stimolare la riflessione critica degli studenti sui concetti chiave dell’Unità didattica.
Le risposte devono essere 4, con una risposta corretta e tre distrattori (risposte incorrette o parzialmente corrette). Ogni opzione deve essere plausibile e coerente con il contenuto dell’Unità didattica.
La lunghezza delle risposte deve essere simile tra loro per evitare di rivelare indizi sul corretto o scorretto.
Ogni risposta deve essere accompagnata da una spiegazione chiara e dettagliata.

Per la risposta corretta:

Fornisci una spiegazione esauriente che chiarisca il concetto chiave affrontato nell’Unità didattica e la ragione per cui la risposta è corretta.

Per i distrattori:

Costruisci distrattori basati su errori concettuali che studenti avanzati potrebbero fare.
Spiega perché i distrattori sono errati, utilizzando frasi come: "è in parte giusta, ma..." oppure "sebbene questa risposta sembri corretta, manca di...". Evidenzia gli aspetti confusi o fraintendibili e come si collegano erroneamente al concetto chiave.

Struttura della domanda:

Domanda: qui va inserita la domanda

Risposte (una per ogni riga): a) b) c) d)

Analisi della risposta corretta: qui va messa l’analisi della risposta corretta

Analisi dei distrattori: qui va messa la spiegazione del motivo per cui i distrattori sono completamente o parzialmente errati."#;

/// Checklist: difficulty level, key concept, question type, distractor taxonomy.
pub const GUIDED_PROMPT: &str = r#"Genera una domanda a scelta multipla basata sul seguente testo: {text}. Segui le linee guida qui sotto per strutturare la domanda:

- Stimolo chiaro: La domanda deve essere formulata in modo chiaro e preciso, testando un concetto chiave o una competenza specifica dell'unità didattica.
- Livello di difficoltà: La domanda deve essere di livello [base/intermedio/avanzato], mirata a verificare [concetti di comprensione generale/applicazione pratica/sintesi critica].
- Quattro opzioni di risposta: Fornisci quattro risposte alternative (a, b, c, d), una delle quali corretta. Tutte le risposte devono essere formulate in modo uniforme in termini di lunghezza, struttura grammaticale e complessità per evitare indizi involontari.
- Distrattori plausibili: I tre distrattori devono rappresentare diversi tipi di errori concettuali, come fraintendimenti comuni, generalizzazioni eccessive o interpretazioni erronee. Ogni distrattore deve essere plausibile, ma chiaramente errato rispetto alla risposta corretta.
- Concetti chiave: La domanda deve essere centrata su un concetto chiave ben definito all'interno del testo fornito, evitando ambiguità.
- Tipo di domanda: Indica se la domanda verifica la comprensione teorica o la capacità di applicare il concetto in un contesto pratico.
- Analisi della risposta corretta: Fornisci una spiegazione dettagliata e chiara che illustri perché la risposta corretta è giusta, collegandola direttamente al concetto chiave dell'unità didattica.
- Analisi dei distrattori: Spiega perché ciascun distrattore è sbagliato o parzialmente corretto. Usa frasi come "è parzialmente corretto, ma..." o "sebbene sembri plausibile, manca di...". Spiega il tipo di errore concettuale commesso.

Struttura della domanda:

- Domanda: inserisci qui la domanda.
- Risposte (una per riga):
    a) Risposta 1
    b) Risposta 2
    c) Risposta 3
    d) Risposta 4
- Analisi della risposta corretta: inserisci qui l'analisi della risposta corretta.
- Analisi dei distrattori: inserisci qui l'analisi dettagliata dei distrattori.

Assicurati che tutte le risposte siano ben formulate e che i distrattori siano coerenti ma concettualmente errati."#;

/// Built-in prompt wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptVariant {
    /// Free-form guidance with detailed explanations. (default)
    #[default]
    Reflective,
    /// Fixed question / answers / analysis layout.
    Structured,
    /// Checklist covering difficulty, key concept and distractor types.
    Guided,
}

impl PromptVariant {
    pub fn template_text(self) -> &'static str {
        match self {
            PromptVariant::Reflective => REFLECTIVE_PROMPT,
            PromptVariant::Structured => STRUCTURED_PROMPT,
            PromptVariant::Guided => GUIDED_PROMPT,
        }
    }
}

/// A prompt with exactly one `{text}` substitution point.
///
/// Serialises as a bare string; deserialising goes through
/// [`PromptTemplate::new`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Validate and wrap a custom template.
    pub fn new(text: impl Into<String>) -> Result<Self, QuizGenError> {
        let text = text.into();
        let count = text.matches(PLACEHOLDER).count();
        if count != 1 {
            return Err(QuizGenError::InvalidConfig(format!(
                "Prompt template must contain exactly one {PLACEHOLDER} placeholder, found {count}"
            )));
        }
        Ok(Self { text })
    }

    /// Fill the placeholder with one segment's content.
    pub fn render(&self, segment_text: &str) -> String {
        self.text.replacen(PLACEHOLDER, segment_text, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<PromptVariant> for PromptTemplate {
    fn from(variant: PromptVariant) -> Self {
        Self {
            text: variant.template_text().to_string(),
        }
    }
}

impl TryFrom<String> for PromptTemplate {
    type Error = QuizGenError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl From<PromptTemplate> for String {
    fn from(template: PromptTemplate) -> Self {
        template.text
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        PromptVariant::default().into()
    }
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.text.chars().take(40).collect();
        f.debug_struct("PromptTemplate")
            .field("head", &head)
            .field("len", &self.text.len())
            .finish()
    }
}
