//! Search term tokenizer.
//!
//! Terms are separated by whitespace. Single- or double-quoted substrings
//! are kept whole, so `red "dining chair"` yields `red` and `dining chair`.
//! Outside single quotes a backslash escapes the next character.

use crate::error::QueryError;

/// Splits `input` into search terms.
///
/// Quote characters left at either end of a term are stripped and empty
/// terms are dropped.
pub fn split_terms(input: &str) -> Result<Vec<String>, QueryError> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut in_term = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => match chars.next() {
                Some(next @ ('"' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => return Err(unclosed(input)),
            },
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_term = true;
                }
                '\\' => {
                    let next = chars.next().ok_or_else(|| {
                        QueryError::TermSyntax(format!("no escaped character in {input:?}"))
                    })?;
                    current.push(next);
                    in_term = true;
                }
                c if c.is_whitespace() => {
                    if in_term {
                        push_term(&mut terms, &current);
                        current.clear();
                        in_term = false;
                    }
                }
                c => {
                    current.push(c);
                    in_term = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err(unclosed(input));
    }
    if in_term {
        push_term(&mut terms, &current);
    }
    Ok(terms)
}

fn push_term(terms: &mut Vec<String>, raw: &str) {
    let term = raw.trim_matches(['\'', '"']);
    if !term.is_empty() {
        terms.push(term.to_string());
    }
}

fn unclosed(input: &str) -> QueryError {
    QueryError::TermSyntax(format!("no closing quotation in {input:?}"))
}
