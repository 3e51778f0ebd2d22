//! Observation entry form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{Field, FieldError, ObservationInput, Strategy};
use crate::tui::styles::ClinicalTheme;

/// One input box on the form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub field: Field,
    pub hint: &'static str,
    pub value: String,
    /// Inline validation message, cleared on edit
    pub error: Option<String>,
}

impl FormField {
    fn new(field: Field, hint: &'static str) -> Self {
        Self {
            field,
            hint,
            value: String::new(),
            error: None,
        }
    }
}

/// Form state. Categorical hints use Cleveland codes.
pub struct FormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField::new(Field::Age, "years (1-120)"),
                FormField::new(Field::Sex, "0=female, 1=male"),
                FormField::new(Field::ChestPain, "1=typical 2=atypical 3=non-anginal 4=none"),
                FormField::new(Field::RestingBp, "mm Hg (50-250)"),
                FormField::new(Field::Cholesterol, "mg/dl (100-600)"),
                FormField::new(Field::FastingBloodSugar, "1 if > 120 mg/dl, else 0"),
                FormField::new(Field::RestingEcg, "0=normal 1=ST-T 2=LV hypertrophy"),
                FormField::new(Field::MaxHeartRate, "bpm (50-250)"),
                FormField::new(Field::ExerciseAngina, "0=no, 1=yes"),
                FormField::new(Field::StDepression, "0-10, one decimal"),
                FormField::new(Field::StSlope, "1=up 2=flat 3=down"),
                FormField::new(Field::Vessels, "0-4 colored by fluoroscopy"),
                FormField::new(Field::Thalassemia, "3=normal 6=fixed 7=reversible"),
            ],
            selected_field: 0,
        }
    }
}

impl FormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        if c.is_ascii_digit() || c == '.' {
            let field = &mut self.fields[self.selected_field];
            field.value.push(c);
            field.error = None;
        }
    }

    pub fn delete_char(&mut self) {
        let field = &mut self.fields[self.selected_field];
        field.value.pop();
        field.error = None;
    }

    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        field.value.zeroize();
        field.error = None;
    }

    /// Wipe every buffer and error, returning the form to its initial state.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
            field.error = None;
        }
        self.selected_field = 0;
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|f| f.error.is_some())
    }

    /// Attach validation errors to their fields.
    pub fn apply_errors(&mut self, errors: &[FieldError]) {
        for error in errors {
            if let Some(field) = self.fields.iter_mut().find(|f| f.field == error.field) {
                field.error = Some(error.message.clone());
            }
        }
        if let Some(first) = self.fields.iter().position(|f| f.error.is_some()) {
            self.selected_field = first;
        }
    }

    /// Parse every box into raw input.
    ///
    /// # Errors
    /// Returns one error per empty or unparseable field.
    pub fn to_input(&self) -> Result<ObservationInput, Vec<FieldError>> {
        let mut values = Vec::with_capacity(self.fields.len());
        let mut errors = Vec::new();

        for field in &self.fields {
            let text = field.value.trim();
            if text.is_empty() {
                errors.push(FieldError::new(field.field, "Required"));
                continue;
            }
            match text.parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) => errors.push(FieldError::new(field.field, "Invalid number")),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        ObservationInput::from_vec(&values)
            .map_err(|msg| vec![FieldError::new(Field::Age, msg)])
    }

    /// Load a typical high-risk patient (Cleveland record #1).
    pub fn load_sample_data(&mut self) {
        let sample = [
            "63",  // age
            "1",   // sex
            "1",   // cp (typical angina)
            "145", // trestbps
            "233", // chol
            "1",   // fbs
            "2",   // restecg
            "150", // thalach
            "0",   // exang
            "2.3", // oldpeak
            "3",   // slope (downsloping)
            "0",   // ca
            "6",   // thal (fixed defect)
        ];
        for (field, val) in self.fields.iter_mut().zip(sample) {
            field.value = val.to_string();
            field.error = None;
        }
    }
}

/// Render the observation form
pub fn render_form(f: &mut Frame, area: Rect, state: &FormState, strategy: Strategy, endpoint: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Fields
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_form_header(f, chunks[0], strategy, endpoint);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect, strategy: Strategy, endpoint: &str) {
    let target = match strategy {
        Strategy::Local => "local heuristic scorer".to_string(),
        Strategy::Remote => format!("remote predictor at {endpoint}"),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("Cardiorisk", ClinicalTheme::title()),
        Span::styled(" │ Observation Entry │ ", ClinicalTheme::text_secondary()),
        Span::styled(target, ClinicalTheme::focused()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &FormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(f, columns[1], &state.fields[mid..], mid, state.selected_field);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;

        let border_style = match (&field.error, is_selected) {
            (Some(_), _) => ClinicalTheme::danger(),
            (None, true) => ClinicalTheme::border_focused(),
            (None, false) => ClinicalTheme::border(),
        };
        let title_style = if is_selected {
            ClinicalTheme::focused()
        } else {
            ClinicalTheme::text_secondary()
        };

        let mut block = Block::default()
            .title(Span::styled(
                format!(" {} ({}) ", field.field.label(), field.field.key()),
                title_style,
            ))
            .borders(Borders::ALL)
            .border_style(border_style);
        if let Some(err) = &field.error {
            block = block.title_bottom(Span::styled(format!(" ! {err} "), ClinicalTheme::danger()));
        }

        let mut spans = vec![Span::raw(" ")];
        if field.value.is_empty() {
            spans.push(Span::styled(field.hint, ClinicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(field.value.as_str(), ClinicalTheme::text()));
        }
        if is_selected {
            spans.push(Span::styled("▌", ClinicalTheme::cursor()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &FormState) {
    let content = if state.has_errors() {
        Line::from(vec![
            Span::styled("! ", ClinicalTheme::danger()),
            Span::styled(
                "Some values are missing or out of range",
                ClinicalTheme::danger(),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", ClinicalTheme::key_hint()),
            Span::styled("Navigate ", ClinicalTheme::key_desc()),
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Assess ", ClinicalTheme::key_desc()),
            Span::styled("[M] ", ClinicalTheme::key_hint()),
            Span::styled("Strategy ", ClinicalTheme::key_desc()),
            Span::styled("[S] ", ClinicalTheme::key_hint()),
            Span::styled("Sample ", ClinicalTheme::key_desc()),
            Span::styled("[R] ", ClinicalTheme::key_hint()),
            Span::styled("Reset ", ClinicalTheme::key_desc()),
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalObservation, Coding};

    #[test]
    fn test_sample_data_validates() {
        let mut form = FormState::default();
        form.load_sample_data();
        let input = form.to_input().expect("Sample parses");
        let obs = ClinicalObservation::from_input(&input, Coding::Cleveland).expect("Sample is valid");
        assert_eq!(obs.age, 63);
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let form = FormState::default();
        let errors = form.to_input().expect_err("Empty form");
        assert_eq!(errors.len(), 13);
        assert!(errors.iter().all(|e| e.message == "Required"));
    }

    #[test]
    fn test_input_filters_characters() {
        let mut form = FormState::default();
        for c in "6a5-".chars() {
            form.input_char(c);
        }
        assert_eq!(form.fields[0].value, "65");
    }

    #[test]
    fn test_errors_attach_inline_and_clear_on_edit() {
        let mut form = FormState::default();
        form.load_sample_data();
        form.apply_errors(&[FieldError::new(Field::Cholesterol, "Value must be between 100 and 600")]);

        assert!(form.has_errors());
        assert_eq!(form.selected_field, 4);
        assert!(form.fields[4].error.is_some());

        form.delete_char();
        assert!(!form.has_errors());
    }

    #[test]
    fn test_clear_sensitive_resets_form() {
        let mut form = FormState::default();
        form.load_sample_data();
        form.next_field();
        form.clear_sensitive();
        assert!(form.fields.iter().all(|f| f.value.is_empty()));
        assert_eq!(form.selected_field, 0);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut form = FormState::default();
        form.prev_field();
        assert_eq!(form.selected_field, 12);
        form.next_field();
        assert_eq!(form.selected_field, 0);
    }
}
