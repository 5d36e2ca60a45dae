//! # Function Expressions
//!
//! Declarative function definitions as they appear in form definition files.
//! Each expression is a single-key JSON object naming the operation:
//!
//! ```json
//! {"IF": {"cond": {"STRCMP": [{"VALUE": "Geschlecht"}, {"LITERAL": "w"}]},
//!         "then": {"LITERAL": "Frau"},
//!         "else": {"LITERAL": "Herr"}}}
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A declarative function expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Expr {
    /// Constant string
    Literal(String),
    /// Current value of a field
    Value(String),
    /// True iff the field holds a non-empty value
    HasValue(String),
    /// Concatenation of all operands
    Cat(Vec<Expr>),
    /// Conditional; a missing `else` yields the empty string
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Expr>>,
    },
    /// True iff all operands render to the same string
    #[serde(rename = "STRCMP")]
    StrCmp(Vec<Expr>),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    /// True iff the whole rendered value matches the pattern
    Match { value: Box<Expr>, pattern: String },
    /// Replace every match of the pattern
    Replace {
        value: Box<Expr>,
        pattern: String,
        with: String,
    },
    /// Number of characters
    Length(Box<Expr>),
    /// Decimal sum; empty operands count as zero
    Sum(Vec<Expr>),
    /// Negated decimal sum
    Minus(Vec<Expr>),
    /// First operand minus all others
    Diff(Vec<Expr>),
    /// Decimal product
    Product(Vec<Expr>),
    /// Absolute value of the sum
    Abs(Vec<Expr>),
    /// `-1`, `0` or `1` for the sign of the sum
    Sign(Vec<Expr>),
    /// Decimal quotient rounded half up to at most `max` and padded to at
    /// least `min` fractional digits. Without `by` the value is only
    /// reformatted.
    #[serde(alias = "FORMAT")]
    Divide {
        value: Box<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by: Option<Box<Expr>>,
        #[serde(default)]
        min: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
    },
    /// First value less than all others
    Lt(Compare),
    /// First value less than or equal to all others
    Le(Compare),
    /// First value greater than all others
    Gt(Compare),
    /// First value greater than or equal to all others
    Ge(Compare),
    /// `"true"`, `"-1"`, `"1"` or `"0"` for equal, smaller, larger or mixed
    #[serde(rename = "NUMCMP")]
    NumCmp(Compare),
    /// First non-empty result of the operands that evaluate without error
    Select {
        values: Vec<Expr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_error: Option<Box<Expr>>,
    },
    /// Evaluate `function` with some field ids replaced by other functions
    Bind {
        function: Box<Expr>,
        #[serde(default)]
        set: BTreeMap<String, Expr>,
    },
    /// The `index`th piece of the value split at every match of the pattern
    Split {
        value: Box<Expr>,
        pattern: String,
        index: usize,
    },
    /// A value from the last selection of a function dialog
    Dialog { dialog: String, data: String },
    /// A function registered by name in the library
    Call(String),
    /// True iff evaluating the operand fails
    #[serde(rename = "ISERROR")]
    IsError(Box<Expr>),
}

/// Operands of a numeric comparison; the first one is compared against
/// the rest, with differences up to `margin` counting as equal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compare {
    pub values: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Box<Expr>>,
}

impl Compare {
    pub fn new(values: Vec<Expr>) -> Self {
        Self {
            values,
            margin: None,
        }
    }

    pub fn with_margin(mut self, margin: Expr) -> Self {
        self.margin = Some(Box::new(margin));
        self
    }
}

impl Expr {
    pub fn literal(s: impl Into<String>) -> Self {
        Expr::Literal(s.into())
    }

    pub fn value(id: impl Into<String>) -> Self {
        Expr::Value(id.into())
    }

    pub fn has_value(id: impl Into<String>) -> Self {
        Expr::HasValue(id.into())
    }

    pub fn strcmp(a: Expr, b: Expr) -> Self {
        Expr::StrCmp(vec![a, b])
    }

    pub fn if_then_else(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Some(Box::new(otherwise)),
        }
    }

    pub fn matches(value: Expr, pattern: impl Into<String>) -> Self {
        Expr::Match {
            value: Box::new(value),
            pattern: pattern.into(),
        }
    }

    pub fn dialog(dialog: impl Into<String>, data: impl Into<String>) -> Self {
        Expr::Dialog {
            dialog: dialog.into(),
            data: data.into(),
        }
    }

    /// Names of all function dialogs read anywhere in this expression
    pub fn dialog_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut todo = vec![self];
        while let Some(expr) = todo.pop() {
            if let Expr::Dialog { dialog, .. } = expr {
                names.insert(dialog.clone());
            }
            todo.extend(expr.children());
        }
        names
    }

    /// Operands of this expression, in declaration order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_)
            | Expr::Value(_)
            | Expr::HasValue(_)
            | Expr::Dialog { .. }
            | Expr::Call(_) => Vec::new(),
            Expr::Cat(items)
            | Expr::StrCmp(items)
            | Expr::And(items)
            | Expr::Or(items)
            | Expr::Sum(items)
            | Expr::Minus(items)
            | Expr::Diff(items)
            | Expr::Product(items)
            | Expr::Abs(items)
            | Expr::Sign(items) => items.iter().collect(),
            Expr::Lt(cmp) | Expr::Le(cmp) | Expr::Gt(cmp) | Expr::Ge(cmp) | Expr::NumCmp(cmp) => {
                cmp.values.iter().chain(cmp.margin.as_deref()).collect()
            }
            Expr::Divide { value, by, .. } => {
                std::iter::once(value.as_ref()).chain(by.as_deref()).collect()
            }
            Expr::Select { values, on_error } => {
                values.iter().chain(on_error.as_deref()).collect()
            }
            Expr::Bind { function, set } => std::iter::once(function.as_ref())
                .chain(set.values())
                .collect(),
            Expr::If {
                cond,
                then,
                otherwise,
            } => {
                let mut out = vec![cond.as_ref(), then.as_ref()];
                if let Some(e) = otherwise {
                    out.push(e.as_ref());
                }
                out
            }
            Expr::Not(e) | Expr::Length(e) | Expr::IsError(e) => vec![e.as_ref()],
            Expr::Match { value, .. } | Expr::Replace { value, .. } | Expr::Split { value, .. } => {
                vec![value.as_ref()]
            }
        }
    }
}
