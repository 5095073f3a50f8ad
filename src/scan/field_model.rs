use serde::{Deserialize, Serialize};

use crate::dom::NodeId;
use crate::matching::ChoiceText;

/// Label used when no label source yields text.
pub const NO_LABEL: &str = "No label";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Select,
    Textarea,
    Checkbox,
    Radio,
    File,
    RadioGroup,
    CheckboxGroup,
    CustomSelect,
    Combobox,
    ButtonGroup,
    Unknown,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Select => "select",
            FieldKind::Textarea => "textarea",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::File => "file",
            FieldKind::RadioGroup => "radio_group",
            FieldKind::CheckboxGroup => "checkbox_group",
            FieldKind::CustomSelect => "custom_select",
            FieldKind::Combobox => "combobox",
            FieldKind::ButtonGroup => "button_group",
            FieldKind::Unknown => "unknown",
        }
    }

    /// Kinds whose value is chosen from a bounded option list.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldKind::Select
                | FieldKind::RadioGroup
                | FieldKind::CheckboxGroup
                | FieldKind::CustomSelect
                | FieldKind::Combobox
                | FieldKind::ButtonGroup
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
            checked: None,
        }
    }

    pub fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }
}

impl ChoiceText for FieldOption {
    fn choice_value(&self) -> &str {
        &self.value
    }
    fn choice_text(&self) -> &str {
        &self.text
    }
}

/// Where recovered options came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    /// A real `<select>` backing the visible input.
    NativeSelect(NodeId),
    /// An ARIA listbox referenced by the input.
    Listbox(NodeId),
    /// A widget wrapper around the input.
    Wrapper(NodeId),
    /// Synthesized Yes/No.
    YesNoHeuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub hint: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip)]
    pub option_source: Option<OptionSource>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            hint: String::new(),
            kind,
            required: false,
            options: None,
            current_value: None,
            name: None,
            option_source: None,
        }
    }

    pub fn options(&self) -> &[FieldOption] {
        self.options.as_deref().unwrap_or(&[])
    }

    /// Label and hint joined, as used by the question classifiers.
    pub fn question_text(&self) -> String {
        if self.hint.is_empty() {
            self.label.clone()
        } else {
            format!("{} {}", self.label, self.hint)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Button,
    Submit,
    RoleButton,
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub role_title: String,
    #[serde(default)]
    pub job_description: String,
}

impl JobContext {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_empty() && self.role_title.is_empty() && self.job_description.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub fields: Vec<FieldDescriptor>,
    pub actions: Vec<ActionDescriptor>,
}

impl ScanResult {
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }
}
