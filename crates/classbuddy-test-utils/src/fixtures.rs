use classbuddy_store::{LessonPlan, LessonSection};

/// A three-section, 50-minute plan with every optional field populated.
pub fn sample_plan() -> LessonPlan {
    LessonPlan {
        subject: "Ciências".to_string(),
        objective: "Compreender o ciclo da água e sua importância para a vida".to_string(),
        total_duration: 50,
        sections: vec![
            LessonSection {
                title: "Introdução".to_string(),
                content: "Onde está a água do planeta? Discussão inicial com a turma.".to_string(),
                duration: 10,
                activities: Some(vec!["Chuva de ideias no quadro".to_string()]),
            },
            LessonSection {
                title: "Evaporação e condensação".to_string(),
                content: "O Sol aquece a água, que evapora e forma nuvens.".to_string(),
                duration: 25,
                activities: Some(vec![
                    "Experimento com pote, filme plástico e gelo".to_string(),
                    "Registro das observações".to_string(),
                ]),
            },
            LessonSection {
                title: "Fechamento".to_string(),
                content: "Retomada dos conceitos e perguntas.".to_string(),
                duration: 15,
                activities: None,
            },
        ],
        methodology: Some("Aula expositiva dialogada com experimento".to_string()),
        evaluation: Some("Participação e registro do experimento".to_string()),
        resources: Some(vec!["Pote de vidro".to_string(), "Gelo".to_string()]),
    }
}

/// A plan with `n` ten-minute sections and no optional fields.
pub fn plan_with_sections(n: usize) -> LessonPlan {
    LessonPlan {
        subject: "Matemática".to_string(),
        objective: "Praticar frações".to_string(),
        total_duration: u32::try_from(n * 10).unwrap_or(u32::MAX),
        sections: (1..=n)
            .map(|i| LessonSection {
                title: format!("Parte {i}"),
                content: format!("Conteúdo da parte {i}."),
                duration: 10,
                activities: None,
            })
            .collect(),
        methodology: None,
        evaluation: None,
        resources: None,
    }
}
