//! Lesson prompt construction.
//!
//! Validates the user's request and renders the system and user prompts that
//! ask the model for a single JSON lesson plan. Pure logic, no I/O.

use serde::{Deserialize, Serialize};

use super::error::GenerateError;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MAX_CONTENT_CHARS: usize = 50_000;
pub const MAX_SOURCE_CHARS: usize = 100_000;
pub const MAX_SUBJECT_CHARS: usize = 200;
pub const MIN_TOTAL_TIME: u32 = 10;
pub const MAX_TOTAL_TIME: u32 = 480;

/// Source text beyond this many characters is cut before it reaches the prompt.
pub const SOURCE_EMBED_CHARS: usize = 8_000;

const TRUNCATION_MARKER: &str = "...\n[Truncated]";

/// Subject used in the prompt when the user left it blank.
pub const DEFAULT_SUBJECT: &str = "Geral";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    /// Topic or content to teach. May be empty when `source_text` is given.
    #[serde(default)]
    pub content: String,
    /// Lesson length in minutes.
    pub total_time: u32,
    #[serde(default)]
    pub subject: String,
    /// Research material (e.g. text extracted from a PDF).
    #[serde(
        default,
        rename = "pdfContent",
        alias = "sourceText",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_text: Option<String>,
}

impl LessonRequest {
    pub fn new(content: impl Into<String>, total_time: u32, subject: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            total_time,
            subject: subject.into(),
            source_text: None,
        }
    }

    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    /// Source text if present and not blank.
    pub fn source(&self) -> Option<&str> {
        self.source_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Check that the request can produce a prompt.
    ///
    /// Rejects an empty request (no content, no source), out-of-range lesson
    /// length and oversized fields.
    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.content.trim().is_empty() && self.source().is_none() {
            return Err(GenerateError::validation(
                "content",
                "Por favor, insira o conteúdo para a aula ou envie um PDF.",
            ));
        }
        if self.content.chars().count() > MAX_CONTENT_CHARS {
            return Err(GenerateError::validation(
                "content",
                format!("O conteúdo excede {MAX_CONTENT_CHARS} caracteres."),
            ));
        }
        if let Some(src) = &self.source_text
            && src.chars().count() > MAX_SOURCE_CHARS
        {
            return Err(GenerateError::validation(
                "pdfContent",
                format!("O material de pesquisa excede {MAX_SOURCE_CHARS} caracteres."),
            ));
        }
        if !(MIN_TOTAL_TIME..=MAX_TOTAL_TIME).contains(&self.total_time) {
            return Err(GenerateError::validation(
                "totalTime",
                format!(
                    "A duração deve estar entre {MIN_TOTAL_TIME} e {MAX_TOTAL_TIME} minutos."
                ),
            ));
        }
        if self.subject.chars().count() > MAX_SUBJECT_CHARS {
            return Err(GenerateError::validation(
                "subject",
                format!("A disciplina excede {MAX_SUBJECT_CHARS} caracteres."),
            ));
        }
        Ok(())
    }

    /// Subject as it appears in the prompt.
    pub fn prompt_subject(&self) -> &str {
        let trimmed = self.subject.trim();
        if trimmed.is_empty() {
            DEFAULT_SUBJECT
        } else {
            trimmed
        }
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Number of sections to ask for, scaled with lesson length.
pub fn section_target(total_time: u32) -> u32 {
    match total_time {
        0..=60 => 5,
        61..=120 => 7,
        121..=180 => 9,
        _ => 12,
    }
}

/// Minimum words per section content, scaled with lesson length.
pub fn min_words_per_section(total_time: u32) -> u32 {
    match total_time {
        0..=60 => 200,
        61..=120 => 350,
        _ => 500,
    }
}

/// Cut `text` to [`SOURCE_EMBED_CHARS`] characters, marking the cut.
pub fn truncate_source_text(text: &str) -> String {
    match text.char_indices().nth(SOURCE_EMBED_CHARS) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..idx]),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Prompt rendering
// ---------------------------------------------------------------------------

/// The two halves of the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPrompt {
    pub system: String,
    pub user: String,
}

const SYSTEM_PROMPT: &str = "\
Voce e um professor universitario com doutorado e vasta experiencia em sala de aula. \
Sua funcao e criar AULAS COMPLETAS, EXTENSAS e PROFUNDAS.
Voce NAO gera resumos, esquemas ou topicos: voce escreve o CONTEUDO INTEGRAL que sera apresentado em sala de aula.
Cada secao deve parecer um capitulo de livro didatico, com introducao ao tema, desenvolvimento completo dos conceitos, \
exemplos resolvidos passo a passo, estudos de caso, analogias, contexto historico quando relevante e fechamento com reflexao.
O conteudo deve ser EXTENSO: quanto maior a duracao da aula, mais denso e aprofundado deve ser o material.
IMPORTANTE: Retorne APENAS o JSON valido, sem markdown, sem blocos de codigo, sem explicacoes fora do JSON.";

/// Validate `request` and render the prompt for it.
pub fn build_prompt(request: &LessonRequest) -> Result<LessonPrompt, GenerateError> {
    request.validate()?;
    Ok(LessonPrompt {
        system: SYSTEM_PROMPT.to_string(),
        user: build_user_prompt(request),
    })
}

fn build_user_prompt(request: &LessonRequest) -> String {
    let total = request.total_time;
    let sections = section_target(total);
    let min_words = min_words_per_section(total);
    let source = request.source().map(truncate_source_text);

    let mut p = String::with_capacity(4096);

    p.push_str("Crie uma AULA COMPLETA, EXTENSA e APROFUNDADA com as seguintes especificacoes:\n\n");
    p.push_str(&format!("Disciplina: {}\n", request.prompt_subject()));
    p.push_str(&format!(
        "Duracao total: {total} minutos ({:.1} horas)\n",
        f64::from(total) / 60.0
    ));
    p.push_str(&format!("Tema/Conteudo: {}\n", request.content.trim()));

    if let Some(src) = &source {
        p.push_str("\nFONTE DE PESQUISA (Use este material como base para o conteudo da aula):\n");
        p.push_str(src);
        p.push('\n');
    }

    p.push_str("\nREGRAS OBRIGATORIAS:\n\n");
    p.push_str(&format!(
        "1. QUANTIDADE DE SECOES: Gere pelo menos {sections} secoes para cobrir adequadamente {total} minutos de aula.\n"
    ));
    p.push_str(&format!(
        "2. PROFUNDIDADE DO CONTEUDO: Cada campo \"content\" DEVE ter no minimo {min_words} palavras.\n"
    ));
    p.push_str(
        "3. CADA SECAO deve conter introducao ao subtema, explicacao teorica com definicoes, \
pelo menos 2 exemplos praticos resolvidos passo a passo, analogias do cotidiano, \
contexto historico ou curiosidades, conexoes interdisciplinares, perguntas para debate \
e transicao para a proxima secao.\n",
    );
    p.push_str(
        "4. O texto deve ser a FALA COMPLETA do professor, fluida, didatica e pronta para ser lida em voz alta.\n",
    );
    p.push_str(
        "5. ATIVIDADES: Cada secao deve ter pelo menos 1 atividade pratica com instrucoes passo a passo, \
materiais necessarios e resultado esperado.\n",
    );
    p.push_str(&format!(
        "6. DISTRIBUICAO DE TEMPO: A soma das duracoes das secoes deve ser {total} minutos. \
Secoes mais complexas recebem mais tempo; inclua abertura, desenvolvimento e fechamento.\n"
    ));
    p.push_str("7. Para aulas longas (acima de 60 min), inclua secoes de intervalo e recapitulacao.\n");
    if source.is_some() {
        p.push_str(
            "8. OBRIGATORIO: Baseie TODO o conteudo no material de pesquisa fornecido, \
desenvolvendo cada conceito com explicacoes proprias.\n",
        );
    }
    p.push_str("9. METODOLOGIA: Descreva a abordagem pedagogica utilizada.\n");
    p.push_str("10. AVALIACAO: Descreva como o aprendizado sera avaliado.\n");
    p.push_str("11. RECURSOS: Liste os materiais e recursos necessarios.\n\n");

    p.push_str("Retorne APENAS um objeto JSON valido (sem markdown) com esta estrutura exata:\n");
    p.push_str(&schema_block(total, min_words));
    p
}

fn schema_block(total: u32, min_words: u32) -> String {
    format!(
        r#"{{
  "subject": "nome da disciplina",
  "objective": "objetivo geral da aula em uma frase clara e especifica",
  "totalDuration": {total},
  "methodology": "descricao da metodologia pedagogica",
  "evaluation": "criterios e instrumentos de avaliacao",
  "resources": ["Recurso 1", "Recurso 2"],
  "sections": [
    {{
      "title": "Titulo descritivo da secao",
      "duration": numero_em_minutos,
      "content": "CONTEUDO COMPLETO. Minimo {min_words} palavras.",
      "activities": ["Atividade detalhada com passo a passo"]
    }}
  ]
}}"#
    )
}
