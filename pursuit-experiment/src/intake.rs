use pursuit_core::Participant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeField {
    ParticipantId,
    Name,
    Age,
}

impl IntakeField {
    pub const ALL: [IntakeField; 3] = [Self::ParticipantId, Self::Name, Self::Age];

    pub fn label(&self) -> &'static str {
        match self {
            Self::ParticipantId => "Participant ID",
            Self::Name => "Name",
            Self::Age => "Age",
        }
    }

    fn next(&self) -> Self {
        match self {
            Self::ParticipantId => Self::Name,
            Self::Name => Self::Age,
            Self::Age => Self::ParticipantId,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn accepts(&self, ch: char) -> bool {
        match self {
            Self::Age => ch.is_ascii_digit(),
            _ => !ch.is_control(),
        }
    }
}

/// Participant-info entry screen state.
#[derive(Debug, Clone, Default)]
pub struct IntakeForm {
    values: [String; 3],
    active: usize,
}

impl IntakeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> IntakeField {
        IntakeField::ALL[self.active]
    }

    pub fn value(&self, field: IntakeField) -> &str {
        &self.values[field.index()]
    }

    pub fn next_field(&mut self) {
        self.active = self.active().next().index();
    }

    pub fn backspace(&mut self) {
        self.values[self.active].pop();
    }

    /// Appends typed text to the active field, dropping characters it does not accept.
    pub fn insert_text(&mut self, text: &str) {
        let field = self.active();
        self.values[self.active].extend(text.chars().filter(|c| field.accepts(*c)));
    }

    /// Returns the participant once every field is filled in and the age parses.
    pub fn submit(&self) -> Option<Participant> {
        if self.values.iter().any(|v| v.is_empty()) {
            return None;
        }
        let age = self.value(IntakeField::Age).parse().ok()?;
        Some(Participant::new(
            self.value(IntakeField::ParticipantId),
            self.value(IntakeField::Name),
            age,
        ))
    }
}
