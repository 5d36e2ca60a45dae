//! # Function Library
//!
//! Resolves declarative expressions into `FunctionRef`s. Named functions can
//! be registered up front and referenced with `CALL`.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use regex::Regex;
use rust_decimal::Decimal;

use super::dialog::DialogLibrary;
use super::errors::{FunctionError, FunctionResult};
use super::expr::{Compare, Expr};
use super::function::{Function, FunctionRef};
use super::number::{self, parse_decimal, Arithmetic, Comparison, MAX_SCALE};
use super::provider::{bool_str, is_true, ValueProvider};

/// Library of named functions plus the expression resolver
#[derive(Default)]
pub struct FunctionLibrary {
    /// Named functions for `CALL`
    by_name: HashMap<String, FunctionRef>,

    /// Dialogs visible to `DIALOG`
    dialogs: Option<Rc<dyn DialogLibrary>>,
}

impl FunctionLibrary {
    /// Create an empty library without dialogs
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty library whose `DIALOG` expressions read from `dialogs`
    pub fn with_dialogs(dialogs: Rc<dyn DialogLibrary>) -> Self {
        Self {
            by_name: HashMap::new(),
            dialogs: Some(dialogs),
        }
    }

    /// Register a named function. A later definition replaces an earlier one.
    pub fn define(&mut self, name: impl Into<String>, function: FunctionRef) {
        self.by_name.insert(name.into(), function);
    }

    /// Get a named function
    pub fn get(&self, name: &str) -> FunctionResult<FunctionRef> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| FunctionError::UnknownFunction(name.to_string()))
    }

    /// The dialog library, if any
    pub fn dialogs(&self) -> Option<&Rc<dyn DialogLibrary>> {
        self.dialogs.as_ref()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Resolve an expression into a function.
    ///
    /// Patterns are compiled, names are looked up and operand counts are
    /// checked here, so a resolved function can only fail at evaluation time
    /// for data-dependent reasons.
    pub fn resolve(&self, expr: &Expr) -> FunctionResult<FunctionRef> {
        let mut params = BTreeSet::new();
        let mut dialogs = BTreeSet::new();
        let root = self.compile(expr, &mut params, &mut dialogs)?;
        Ok(Rc::new(ExprFunction {
            root,
            params: params.into_iter().collect(),
            dialogs: dialogs.into_iter().collect(),
        }))
    }

    fn compile(
        &self,
        expr: &Expr,
        params: &mut BTreeSet<String>,
        dialogs: &mut BTreeSet<String>,
    ) -> FunctionResult<Node> {
        let node = match expr {
            Expr::Literal(s) => Node::Literal(s.clone()),
            Expr::Value(id) => {
                params.insert(id.clone());
                Node::Value(id.clone())
            }
            Expr::HasValue(id) => {
                params.insert(id.clone());
                Node::HasValue(id.clone())
            }
            Expr::Cat(items) => Node::Cat(self.compile_all(items, params, dialogs)?),
            Expr::If {
                cond,
                then,
                otherwise,
            } => Node::If {
                cond: Box::new(self.compile(cond, params, dialogs)?),
                then: Box::new(self.compile(then, params, dialogs)?),
                otherwise: match otherwise {
                    Some(e) => Some(Box::new(self.compile(e, params, dialogs)?)),
                    None => None,
                },
            },
            Expr::StrCmp(items) => Node::StrCmp(self.compile_all(items, params, dialogs)?),
            Expr::Not(e) => Node::Not(Box::new(self.compile(e, params, dialogs)?)),
            Expr::And(items) => Node::And(self.compile_all(items, params, dialogs)?),
            Expr::Or(items) => Node::Or(self.compile_all(items, params, dialogs)?),
            Expr::Match { value, pattern } => Node::Match {
                value: Box::new(self.compile(value, params, dialogs)?),
                pattern: compile_pattern(&format!("^(?:{})$", pattern), pattern)?,
            },
            Expr::Replace {
                value,
                pattern,
                with,
            } => Node::Replace {
                value: Box::new(self.compile(value, params, dialogs)?),
                pattern: compile_pattern(pattern, pattern)?,
                with: with.clone(),
            },
            Expr::Length(e) => Node::Length(Box::new(self.compile(e, params, dialogs)?)),
            Expr::Sum(items) => self.arithmetic(Arithmetic::Sum, items, params, dialogs)?,
            Expr::Minus(items) => self.arithmetic(Arithmetic::Minus, items, params, dialogs)?,
            Expr::Diff(items) => self.arithmetic(Arithmetic::Diff, items, params, dialogs)?,
            Expr::Product(items) => self.arithmetic(Arithmetic::Product, items, params, dialogs)?,
            Expr::Abs(items) => self.arithmetic(Arithmetic::Abs, items, params, dialogs)?,
            Expr::Sign(items) => self.arithmetic(Arithmetic::Sign, items, params, dialogs)?,
            Expr::Divide { value, by, min, max } => {
                let max = match (by, max) {
                    (Some(_), None) => {
                        return Err(invalid("DIVIDE", "max is required together with by"))
                    }
                    (_, max) => max.unwrap_or(MAX_SCALE),
                };
                if max > MAX_SCALE {
                    return Err(invalid(
                        "DIVIDE",
                        format!("max {} exceeds {} digits", max, MAX_SCALE),
                    ));
                }
                if max < *min {
                    return Err(invalid("DIVIDE", format!("max {} is below min {}", max, min)));
                }
                Node::Divide {
                    value: Box::new(self.compile(value, params, dialogs)?),
                    by: match by {
                        Some(e) => Some(Box::new(self.compile(e, params, dialogs)?)),
                        None => None,
                    },
                    min: *min,
                    max,
                }
            }
            Expr::Lt(cmp) => self.comparison(Comparison::Lt, cmp, params, dialogs)?,
            Expr::Le(cmp) => self.comparison(Comparison::Le, cmp, params, dialogs)?,
            Expr::Gt(cmp) => self.comparison(Comparison::Gt, cmp, params, dialogs)?,
            Expr::Ge(cmp) => self.comparison(Comparison::Ge, cmp, params, dialogs)?,
            Expr::NumCmp(cmp) => self.comparison(Comparison::NumCmp, cmp, params, dialogs)?,
            Expr::Select { values, on_error } => {
                if values.is_empty() {
                    return Err(invalid("SELECT", "needs at least one value"));
                }
                Node::Select {
                    values: self.compile_all(values, params, dialogs)?,
                    on_error: match on_error {
                        Some(e) => Some(Box::new(self.compile(e, params, dialogs)?)),
                        None => None,
                    },
                }
            }
            Expr::Bind { function, set } => {
                // Bound ids are no longer read from the form
                let mut inner_params = BTreeSet::new();
                let inner = self.compile(function, &mut inner_params, dialogs)?;
                for name in set.keys() {
                    inner_params.remove(name);
                }
                params.extend(inner_params);

                let set = set
                    .iter()
                    .map(|(name, e)| Ok((name.clone(), self.compile(e, params, dialogs)?)))
                    .collect::<FunctionResult<Vec<_>>>()?;
                Node::Bind {
                    inner: Box::new(inner),
                    set,
                }
            }
            Expr::Split {
                value,
                pattern,
                index,
            } => Node::Split {
                value: Box::new(self.compile(value, params, dialogs)?),
                pattern: compile_pattern(pattern, pattern)?,
                index: *index,
            },
            Expr::Dialog { dialog, data } => {
                let library = self
                    .dialogs
                    .as_ref()
                    .filter(|lib| lib.contains(dialog))
                    .ok_or_else(|| FunctionError::UnknownDialog(dialog.clone()))?;
                dialogs.insert(dialog.clone());
                Node::Dialog {
                    library: library.clone(),
                    dialog: dialog.clone(),
                    data: data.clone(),
                }
            }
            Expr::Call(name) => {
                let function = self.get(name)?;
                params.extend(function.parameters().iter().cloned());
                dialogs.extend(function.dialog_references().iter().cloned());
                Node::Call(function)
            }
            Expr::IsError(e) => Node::IsError(Box::new(self.compile(e, params, dialogs)?)),
        };
        Ok(node)
    }

    fn compile_all(
        &self,
        items: &[Expr],
        params: &mut BTreeSet<String>,
        dialogs: &mut BTreeSet<String>,
    ) -> FunctionResult<Vec<Node>> {
        items
            .iter()
            .map(|e| self.compile(e, params, dialogs))
            .collect()
    }

    fn arithmetic(
        &self,
        op: Arithmetic,
        items: &[Expr],
        params: &mut BTreeSet<String>,
        dialogs: &mut BTreeSet<String>,
    ) -> FunctionResult<Node> {
        Ok(Node::Arithmetic {
            op,
            items: self.compile_all(items, params, dialogs)?,
        })
    }

    fn comparison(
        &self,
        op: Comparison,
        cmp: &Compare,
        params: &mut BTreeSet<String>,
        dialogs: &mut BTreeSet<String>,
    ) -> FunctionResult<Node> {
        if cmp.values.len() < 2 {
            return Err(invalid(op.name(), "needs at least two values"));
        }
        Ok(Node::Compare {
            op,
            values: self.compile_all(&cmp.values, params, dialogs)?,
            margin: match &cmp.margin {
                Some(e) => Some(Box::new(self.compile(e, params, dialogs)?)),
                None => None,
            },
        })
    }
}

impl fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("FunctionLibrary")
            .field("functions", &names)
            .field("dialogs", &self.dialogs.is_some())
            .finish()
    }
}

fn invalid(function: &str, reason: impl Into<String>) -> FunctionError {
    FunctionError::InvalidArguments {
        function: function.to_string(),
        reason: reason.into(),
    }
}

fn compile_pattern(source: &str, shown: &str) -> FunctionResult<Regex> {
    Regex::new(source).map_err(|e| FunctionError::InvalidPattern {
        pattern: shown.to_string(),
        reason: e.to_string(),
    })
}

/// Compiled expression tree
enum Node {
    Literal(String),
    Value(String),
    HasValue(String),
    Cat(Vec<Node>),
    If {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    StrCmp(Vec<Node>),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    Match {
        value: Box<Node>,
        pattern: Regex,
    },
    Replace {
        value: Box<Node>,
        pattern: Regex,
        with: String,
    },
    Length(Box<Node>),
    Arithmetic {
        op: Arithmetic,
        items: Vec<Node>,
    },
    Divide {
        value: Box<Node>,
        by: Option<Box<Node>>,
        min: u32,
        max: u32,
    },
    Compare {
        op: Comparison,
        values: Vec<Node>,
        margin: Option<Box<Node>>,
    },
    Select {
        values: Vec<Node>,
        on_error: Option<Box<Node>>,
    },
    Bind {
        inner: Box<Node>,
        set: Vec<(String, Node)>,
    },
    Split {
        value: Box<Node>,
        pattern: Regex,
        index: usize,
    },
    Dialog {
        library: Rc<dyn DialogLibrary>,
        dialog: String,
        data: String,
    },
    Call(FunctionRef),
    IsError(Box<Node>),
}

impl Node {
    fn eval(&self, values: &dyn ValueProvider) -> FunctionResult<String> {
        match self {
            Node::Literal(s) => Ok(s.clone()),
            Node::Value(id) => Ok(values.get_string(id)),
            Node::Cat(items) => {
                let mut out = String::new();
                for item in items {
                    out.push_str(&item.eval(values)?);
                }
                Ok(out)
            }
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                if cond.truth(values)? {
                    then.eval(values)
                } else {
                    match otherwise {
                        Some(e) => e.eval(values),
                        None => Ok(String::new()),
                    }
                }
            }
            Node::Replace {
                value,
                pattern,
                with,
            } => Ok(pattern
                .replace_all(&value.eval(values)?, with.as_str())
                .into_owned()),
            Node::Length(e) => Ok(e.eval(values)?.chars().count().to_string()),
            Node::Arithmetic { op, items } => {
                let operands = decimals(items, values)?;
                Ok(number::format_decimal(op.apply(&operands)?))
            }
            Node::Divide { value, by, min, max } => {
                let dividend = parse_decimal(&value.eval(values)?)?;
                let divisor = match by {
                    Some(e) => parse_decimal(&e.eval(values)?)?,
                    None => Decimal::ONE,
                };
                number::divide(dividend, divisor, *min, *max)
            }
            Node::Compare { op, values: items, margin } => {
                let operands = decimals(items, values)?;
                let margin = match margin {
                    Some(e) => parse_decimal(&e.eval(values)?)?,
                    None => Decimal::ZERO,
                };
                Ok(op.apply(&operands, margin).to_string())
            }
            Node::Select { values: items, on_error } => {
                let mut fallback = None;
                let mut failure = None;
                for item in items {
                    match item.eval(values) {
                        Ok(s) if !s.is_empty() => return Ok(s),
                        Ok(s) => {
                            fallback.get_or_insert(s);
                        }
                        Err(e) => match on_error {
                            Some(handler) => return handler.eval(values),
                            None => failure = Some(e),
                        },
                    }
                }
                match (fallback, failure) {
                    (Some(s), _) => Ok(s),
                    (None, Some(e)) => Err(e),
                    (None, None) => Ok(String::new()),
                }
            }
            Node::Bind { inner, set } => with_bound(values, set, |bound| inner.eval(bound)),
            Node::Split {
                value,
                pattern,
                index,
            } => {
                let s = value.eval(values)?;
                Ok(pattern.split(&s).nth(*index).unwrap_or_default().to_string())
            }
            Node::Dialog {
                library,
                dialog,
                data,
            } => library
                .value(dialog, data)
                .ok_or_else(|| FunctionError::DialogPending(dialog.clone())),
            Node::Call(function) => function.evaluate_string(values),
            Node::HasValue(_)
            | Node::StrCmp(_)
            | Node::Not(_)
            | Node::And(_)
            | Node::Or(_)
            | Node::Match { .. }
            | Node::IsError(_) => self.truth(values).map(|b| bool_str(b).to_string()),
        }
    }

    fn truth(&self, values: &dyn ValueProvider) -> FunctionResult<bool> {
        match self {
            Node::HasValue(id) => Ok(!values.get_string(id).is_empty()),
            Node::StrCmp(items) => {
                let mut first: Option<String> = None;
                for item in items {
                    let s = item.eval(values)?;
                    match &first {
                        None => first = Some(s),
                        Some(f) if *f != s => return Ok(false),
                        Some(_) => {}
                    }
                }
                Ok(true)
            }
            Node::Not(e) => Ok(!e.truth(values)?),
            Node::And(items) => {
                for item in items {
                    if !item.truth(values)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Node::Or(items) => {
                for item in items {
                    if item.truth(values)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Node::Match { value, pattern } => Ok(pattern.is_match(&value.eval(values)?)),
            Node::IsError(e) => Ok(e.eval(values).is_err()),
            Node::Call(function) => function.evaluate_bool(values),
            Node::Bind { inner, set } => with_bound(values, set, |bound| inner.truth(bound)),
            _ => self.eval(values).map(|s| is_true(&s)),
        }
    }
}

fn decimals(items: &[Node], values: &dyn ValueProvider) -> FunctionResult<Vec<Decimal>> {
    items
        .iter()
        .map(|item| parse_decimal(&item.eval(values)?))
        .collect()
}

/// Evaluate with the bound ids answered by their functions. A failing bound
/// function reads as empty and fails the whole evaluation afterwards.
fn with_bound<T>(
    values: &dyn ValueProvider,
    set: &[(String, Node)],
    eval: impl FnOnce(&dyn ValueProvider) -> FunctionResult<T>,
) -> FunctionResult<T> {
    let bound = BoundValues {
        outer: values,
        set,
        failure: RefCell::new(None),
    };
    let result = eval(&bound);
    match bound.failure.into_inner() {
        Some(e) => Err(e),
        None => result,
    }
}

struct BoundValues<'a> {
    outer: &'a dyn ValueProvider,
    set: &'a [(String, Node)],
    failure: RefCell<Option<FunctionError>>,
}

impl BoundValues<'_> {
    fn bound(&self, id: &str) -> Option<&Node> {
        self.set
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, node)| node)
    }
}

impl ValueProvider for BoundValues<'_> {
    fn has_value(&self, id: &str) -> bool {
        self.bound(id).is_some() || self.outer.has_value(id)
    }

    fn get_string(&self, id: &str) -> String {
        match self.bound(id) {
            Some(node) => node.eval(self.outer).unwrap_or_else(|e| {
                self.failure.borrow_mut().get_or_insert(e);
                String::new()
            }),
            None => self.outer.get_string(id),
        }
    }
}

/// A function resolved from an `Expr`
struct ExprFunction {
    root: Node,
    params: Vec<String>,
    dialogs: Vec<String>,
}

impl Function for ExprFunction {
    fn parameters(&self) -> &[String] {
        &self.params
    }

    fn dialog_references(&self) -> &[String] {
        &self.dialogs
    }

    fn evaluate_string(&self, values: &dyn ValueProvider) -> FunctionResult<String> {
        self.root.eval(values)
    }

    fn evaluate_bool(&self, values: &dyn ValueProvider) -> FunctionResult<bool> {
        self.root.truth(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::dialog::MapDialogLibrary;
    use crate::functions::function::FnFunction;
    use crate::functions::provider::MapValues;

    fn salutation() -> Expr {
        Expr::if_then_else(
            Expr::strcmp(Expr::value("Geschlecht"), Expr::literal("w")),
            Expr::literal("Frau"),
            Expr::literal("Herr"),
        )
    }

    #[test]
    fn test_salutation() {
        let lib = FunctionLibrary::new();
        let f = lib.resolve(&salutation()).unwrap();
        assert_eq!(f.parameters(), ["Geschlecht".to_string()]);

        let values = MapValues::new().with("Geschlecht", "w");
        assert_eq!(f.evaluate_string(&values).unwrap(), "Frau");
        assert_eq!(f.evaluate_string(&MapValues::new()).unwrap(), "Herr");
    }

    #[test]
    fn test_match_is_whole_string() {
        let lib = FunctionLibrary::new();
        let f = lib.resolve(&Expr::matches(Expr::value("PLZ"), "[0-9]{5}")).unwrap();

        assert!(f.evaluate_bool(&MapValues::new().with("PLZ", "80331")).unwrap());
        assert!(!f.evaluate_bool(&MapValues::new().with("PLZ", "803310")).unwrap());
        assert!(!f.evaluate_bool(&MapValues::new()).unwrap());
    }

    #[test]
    fn test_invalid_pattern_rejected_at_resolve() {
        let lib = FunctionLibrary::new();
        let err = lib
            .resolve(&Expr::matches(Expr::value("x"), "(unclosed"))
            .err()
            .unwrap();
        assert!(matches!(err, FunctionError::InvalidPattern { .. }));
    }

    #[test]
    fn test_parameters_collected_across_tree() {
        let lib = FunctionLibrary::new();
        let expr = Expr::Cat(vec![
            Expr::value("Vorname"),
            Expr::literal(" "),
            Expr::value("Nachname"),
            Expr::Length(Box::new(Expr::value("Vorname"))),
        ]);
        let f = lib.resolve(&expr).unwrap();
        assert_eq!(f.parameters(), ["Nachname".to_string(), "Vorname".to_string()]);
    }

    #[test]
    fn test_sum_and_not_a_number() {
        let lib = FunctionLibrary::new();
        let f = lib
            .resolve(&Expr::Sum(vec![Expr::value("a"), Expr::value("b")]))
            .unwrap();

        let ok = MapValues::new().with("a", "1,5").with("b", "2.5");
        assert_eq!(f.evaluate_string(&ok).unwrap(), "4");

        // Exact decimals, no binary rounding
        let tenths = MapValues::new().with("a", "0.1").with("b", "0.2");
        assert_eq!(f.evaluate_string(&tenths).unwrap(), "0.3");

        let bad = MapValues::new().with("a", "eins");
        assert_eq!(
            f.evaluate_string(&bad).err(),
            Some(FunctionError::NotANumber("eins".into()))
        );
        for raw in ["NaN", "inf", "1e3"] {
            assert_eq!(
                f.evaluate_string(&MapValues::new().with("a", raw)).err(),
                Some(FunctionError::NotANumber(raw.into()))
            );
        }

        let guarded = lib
            .resolve(&Expr::IsError(Box::new(Expr::Sum(vec![Expr::value("a")]))))
            .unwrap();
        assert!(guarded.evaluate_bool(&bad).unwrap());
    }

    #[test]
    fn test_arithmetic_family() {
        let lib = FunctionLibrary::new();
        let operands = || vec![Expr::value("a"), Expr::value("b"), Expr::value("c")];
        let values = MapValues::new().with("a", "10").with("b", "2,5").with("c", "0.5");
        let eval = |expr: Expr| lib.resolve(&expr).unwrap().evaluate_string(&values).unwrap();

        assert_eq!(eval(Expr::Minus(operands())), "-13");
        assert_eq!(eval(Expr::Diff(operands())), "7");
        assert_eq!(eval(Expr::Product(operands())), "12.5");
        assert_eq!(eval(Expr::Abs(vec![Expr::literal("-3"), Expr::literal("1")])), "2");
        assert_eq!(eval(Expr::Sign(vec![Expr::literal("-3"), Expr::literal("1")])), "-1");
        assert_eq!(eval(Expr::Sign(vec![Expr::value("leer")])), "0");
    }

    #[test]
    fn test_divide_and_format() {
        let lib = FunctionLibrary::new();
        let netto = lib
            .resolve(&Expr::Divide {
                value: Box::new(Expr::value("Brutto")),
                by: Some(Box::new(Expr::literal("1,19"))),
                min: 2,
                max: Some(2),
            })
            .unwrap();
        let values = MapValues::new().with("Brutto", "119");
        assert_eq!(netto.evaluate_string(&values).unwrap(), "100.00");
        assert_eq!(
            netto.evaluate_string(&MapValues::new().with("Brutto", "10")).unwrap(),
            "8.40"
        );

        let format: Expr = serde_json::from_value(serde_json::json!({
            "FORMAT": {"value": {"VALUE": "Betrag"}, "min": 1}
        }))
        .unwrap();
        let format = lib.resolve(&format).unwrap();
        assert_eq!(
            format.evaluate_string(&MapValues::new().with("Betrag", "7,50")).unwrap(),
            "7.5"
        );
        assert_eq!(
            format.evaluate_string(&MapValues::new().with("Betrag", "7")).unwrap(),
            "7.0"
        );

        let by_zero = lib
            .resolve(&Expr::Divide {
                value: Box::new(Expr::literal("1")),
                by: Some(Box::new(Expr::value("n"))),
                min: 0,
                max: Some(2),
            })
            .unwrap();
        assert!(matches!(
            by_zero.evaluate_string(&MapValues::new().with("n", "0")),
            Err(FunctionError::Arithmetic(_))
        ));
    }

    #[test]
    fn test_divide_scale_checked_at_resolve() {
        let lib = FunctionLibrary::new();
        let divide = |by: Option<Expr>, min: u32, max: Option<u32>| {
            lib.resolve(&Expr::Divide {
                value: Box::new(Expr::literal("1")),
                by: by.map(Box::new),
                min,
                max,
            })
            .err()
        };

        assert!(matches!(
            divide(Some(Expr::literal("3")), 0, None),
            Some(FunctionError::InvalidArguments { .. })
        ));
        assert!(matches!(
            divide(None, 3, Some(2)),
            Some(FunctionError::InvalidArguments { .. })
        ));
        assert!(matches!(
            divide(None, 0, Some(40)),
            Some(FunctionError::InvalidArguments { .. })
        ));
        assert!(divide(None, 2, None).is_none());
    }

    #[test]
    fn test_numeric_comparisons() {
        let lib = FunctionLibrary::new();
        let adult = lib
            .resolve(&Expr::Ge(Compare::new(vec![
                Expr::value("Alter"),
                Expr::literal("18"),
            ])))
            .unwrap();
        assert_eq!(adult.parameters(), ["Alter".to_string()]);
        assert!(adult.evaluate_bool(&MapValues::new().with("Alter", "18")).unwrap());
        assert!(!adult.evaluate_bool(&MapValues::new().with("Alter", "17,5")).unwrap());
        assert_eq!(
            adult.evaluate_string(&MapValues::new().with("Alter", "9")).unwrap(),
            "false"
        );
        assert!(matches!(
            adult.evaluate_bool(&MapValues::new().with("Alter", "achtzehn")),
            Err(FunctionError::NotANumber(_))
        ));

        let values = MapValues::new().with("a", "1").with("b", "2").with("c", "3");
        let compare = |expr: Expr| lib.resolve(&expr).unwrap().evaluate_string(&values).unwrap();
        let abc = || vec![Expr::value("a"), Expr::value("b"), Expr::value("c")];
        assert_eq!(compare(Expr::Lt(Compare::new(abc()))), "true");
        assert_eq!(compare(Expr::Le(Compare::new(abc()))), "true");
        assert_eq!(compare(Expr::Gt(Compare::new(abc()))), "false");
        assert_eq!(compare(Expr::NumCmp(Compare::new(abc()))), "-1");
        let bac = vec![Expr::value("b"), Expr::value("a"), Expr::value("c")];
        assert_eq!(compare(Expr::NumCmp(Compare::new(bac))), "0");

        // b and c are within a of each other
        let near =
            Compare::new(vec![Expr::value("b"), Expr::value("c")]).with_margin(Expr::value("a"));
        assert_eq!(compare(Expr::NumCmp(near)), "true");

        assert!(matches!(
            lib.resolve(&Expr::Lt(Compare::new(vec![Expr::value("a")]))).err(),
            Some(FunctionError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_select_first_usable_value() {
        let lib = FunctionLibrary::new();
        let broken = || Expr::Sum(vec![Expr::value("Zahl")]);
        let select = |on_error: Option<Expr>| {
            lib.resolve(&Expr::Select {
                values: vec![broken(), Expr::value("Mobil"), Expr::value("Tel")],
                on_error: on_error.map(Box::new),
            })
            .unwrap()
        };

        let values = MapValues::new().with("Zahl", "x").with("Tel", "089 1");
        assert_eq!(select(None).evaluate_string(&values).unwrap(), "089 1");
        assert_eq!(
            select(Some(Expr::literal("Fehler"))).evaluate_string(&values).unwrap(),
            "Fehler"
        );

        // Empty results are only used when nothing else is left
        let empty = MapValues::new().with("Zahl", "x");
        assert_eq!(select(None).evaluate_string(&empty).unwrap(), "");

        let only_broken = lib
            .resolve(&Expr::Select {
                values: vec![broken()],
                on_error: None,
            })
            .unwrap();
        assert_eq!(
            only_broken.evaluate_string(&empty).err(),
            Some(FunctionError::NotANumber("x".into()))
        );
    }

    #[test]
    fn test_bind_replaces_parameters() {
        let lib = FunctionLibrary::new();
        let greeting = Expr::Cat(vec![Expr::literal("Hallo "), Expr::value("Name")]);
        let mut set = std::collections::BTreeMap::new();
        set.insert(
            "Name".to_string(),
            Expr::Cat(vec![Expr::value("Vorname"), Expr::literal(" "), Expr::value("Nachname")]),
        );

        let f = lib
            .resolve(&Expr::Bind {
                function: Box::new(greeting),
                set,
            })
            .unwrap();
        assert_eq!(
            f.parameters(),
            ["Nachname".to_string(), "Vorname".to_string()]
        );

        let values = MapValues::new()
            .with("Name", "ignoriert")
            .with("Vorname", "Erika")
            .with("Nachname", "Muster");
        assert_eq!(f.evaluate_string(&values).unwrap(), "Hallo Erika Muster");
    }

    #[test]
    fn test_bind_failure_fails_the_whole_result() {
        let lib = FunctionLibrary::new();
        let mut set = std::collections::BTreeMap::new();
        set.insert("Wert".to_string(), Expr::Sum(vec![Expr::value("Eingabe")]));
        let f = lib
            .resolve(&Expr::Bind {
                function: Box::new(Expr::has_value("Wert")),
                set,
            })
            .unwrap();

        assert!(f.evaluate_bool(&MapValues::new().with("Eingabe", "5")).unwrap());
        assert_eq!(
            f.evaluate_bool(&MapValues::new().with("Eingabe", "fünf")).err(),
            Some(FunctionError::NotANumber("fünf".into()))
        );
    }

    #[test]
    fn test_split() {
        let lib = FunctionLibrary::new();
        let split = |index| {
            lib.resolve(&Expr::Split {
                value: Box::new(Expr::value("Ort")),
                pattern: " +".into(),
                index,
            })
            .unwrap()
        };
        let values = MapValues::new().with("Ort", "80331  München");
        assert_eq!(split(0).evaluate_string(&values).unwrap(), "80331");
        assert_eq!(split(1).evaluate_string(&values).unwrap(), "München");
        assert_eq!(split(2).evaluate_string(&values).unwrap(), "");
    }

    #[test]
    fn test_replace_and_logic() {
        let lib = FunctionLibrary::new();
        let f = lib
            .resolve(&Expr::Replace {
                value: Box::new(Expr::value("Tel")),
                pattern: "[ /-]".into(),
                with: String::new(),
            })
            .unwrap();
        assert_eq!(
            f.evaluate_string(&MapValues::new().with("Tel", "089 / 233-1")).unwrap(),
            "0892331"
        );

        let both = lib
            .resolve(&Expr::And(vec![
                Expr::has_value("a"),
                Expr::Not(Box::new(Expr::has_value("b"))),
            ]))
            .unwrap();
        assert!(both.evaluate_bool(&MapValues::new().with("a", "x")).unwrap());
        assert_eq!(
            both.evaluate_string(&MapValues::new().with("a", "x").with("b", "y")).unwrap(),
            "false"
        );
    }

    #[test]
    fn test_named_functions() {
        let mut lib = FunctionLibrary::new();
        lib.define(
            "IstMuenchen",
            FnFunction::predicate(["Ort"], |v| Ok(v.get_string("Ort") == "München")).into_ref(),
        );

        let f = lib
            .resolve(&Expr::Or(vec![
                Expr::Call("IstMuenchen".into()),
                Expr::has_value("Postfach"),
            ]))
            .unwrap();
        assert_eq!(f.parameters(), ["Ort".to_string(), "Postfach".to_string()]);
        assert!(f.evaluate_bool(&MapValues::new().with("Ort", "München")).unwrap());

        assert!(matches!(
            lib.resolve(&Expr::Call("Fehlt".into())).err(),
            Some(FunctionError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_dialog_values() {
        let dialogs = Rc::new(MapDialogLibrary::new(["AddressLookup"]));
        let lib = FunctionLibrary::with_dialogs(dialogs.clone());

        let f = lib.resolve(&Expr::dialog("AddressLookup", "Ort")).unwrap();
        assert_eq!(f.dialog_references(), ["AddressLookup".to_string()]);
        assert!(f.parameters().is_empty());
        assert_eq!(
            f.evaluate_string(&MapValues::new()).err(),
            Some(FunctionError::DialogPending("AddressLookup".into()))
        );

        dialogs.select("AddressLookup", [("Ort", "München")]);
        assert_eq!(f.evaluate_string(&MapValues::new()).unwrap(), "München");

        assert!(matches!(
            lib.resolve(&Expr::dialog("Unbekannt", "x")).err(),
            Some(FunctionError::UnknownDialog(_))
        ));
        assert!(matches!(
            FunctionLibrary::new().resolve(&Expr::dialog("AddressLookup", "x")).err(),
            Some(FunctionError::UnknownDialog(_))
        ));
    }
}
