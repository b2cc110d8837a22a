use std::fmt;

/// Closed vocabulary of events stamped onto the physiological recording stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    End,
    MindfulnessBegin,
    MindfulnessEnd,
    RestBegin,
    RestEnd,
    VisitBegin,
    VisitEnd,
    SelectBegin,
    SelectEnd,
    ManiBegin,
    ManiEnd,
    Sickness,
}

impl Marker {
    pub fn name(&self) -> &'static str {
        match self {
            Marker::Start => "Start",
            Marker::End => "End",
            Marker::MindfulnessBegin => "MindfulnessBegin",
            Marker::MindfulnessEnd => "MindfulnessEnd",
            Marker::RestBegin => "RestBegin",
            Marker::RestEnd => "RestEnd",
            Marker::VisitBegin => "VisitBegin",
            Marker::VisitEnd => "VisitEnd",
            Marker::SelectBegin => "SelectBegin",
            Marker::SelectEnd => "SelectEnd",
            Marker::ManiBegin => "ManiBegin",
            Marker::ManiEnd => "ManiEnd",
            Marker::Sickness => "Sickness",
        }
    }

    /// Resolves an externally supplied name against the closed set.
    pub fn from_name(name: &str) -> Option<Marker> {
        Some(match name {
            "Start" => Marker::Start,
            "End" => Marker::End,
            "MindfulnessBegin" => Marker::MindfulnessBegin,
            "MindfulnessEnd" => Marker::MindfulnessEnd,
            "RestBegin" => Marker::RestBegin,
            "RestEnd" => Marker::RestEnd,
            "VisitBegin" => Marker::VisitBegin,
            "VisitEnd" => Marker::VisitEnd,
            "SelectBegin" => Marker::SelectBegin,
            "SelectEnd" => Marker::SelectEnd,
            "ManiBegin" => Marker::ManiBegin,
            "ManiEnd" => Marker::ManiEnd,
            "Sickness" => Marker::Sickness,
            _ => return None,
        })
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
