use crate::formula::{Clause, Formula, Literal};
use crate::reduction::Cnf;
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, BufReader, Read, Write};

#[derive(Clone, Debug, PartialEq)]
pub enum Problem {
    Dnf(Formula),
    Cnf(Cnf),
}

impl Problem {
    // a CNF is negated, so falsifying the result is the same as satisfying the input
    pub fn into_dnf(self) -> Formula {
        match self {
            Problem::Dnf(f) => f,
            Problem::Cnf(cnf) => crate::reduction::negate(&cnf),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Convention {
    Dnf,
    Cnf,
}

struct Header {
    convention: Convention,
    num_variables: usize,
    num_clauses: usize,
}

pub fn parse<R: Read>(reader: R) -> Result<Problem, DimacsParseError> {
    let reader = BufReader::new(reader);

    let mut clauses = vec![];
    let mut clause = vec![];
    let mut header: Option<Header> = None;

    for line in reader.lines() {
        let line = line?;
        let mut line = line.split_whitespace().peekable();

        match line.peek() {
            Some(&"c") | None => continue,
            Some(&"p") => {
                if header.is_some() {
                    return Err(DimacsParseError::Format("duplicate 'p' line".into()));
                }
                let _ = line.next();

                let convention = match line.next() {
                    Some("dnf") => Convention::Dnf,
                    Some("cnf") => Convention::Cnf,
                    _ => return Err(DimacsParseError::Format("missing 'dnf' or 'cnf'".into())),
                };

                let num_variables = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_variables".into()))?;

                let num_clauses = line
                    .next()
                    .and_then(|c| c.parse::<usize>().ok())
                    .ok_or_else(|| DimacsParseError::Format("invalid num_clauses".into()))?;

                header = Some(Header {
                    convention,
                    num_variables,
                    num_clauses,
                });
            }
            Some(_) => {
                let num_variables = match &header {
                    Some(header) => header.num_variables,
                    None => return Err(DimacsParseError::Format("missing 'p' line before clauses".into())),
                };

                // clauses run across lines; only a 0 ends one
                for x in line {
                    match parse_literal(x)? {
                        Some(l) if l.idx() > num_variables => {
                            return Err(DimacsParseError::Format(format!(
                                "literal {} exceeds the {} declared variables",
                                l, num_variables
                            )));
                        }
                        Some(l) => clause.push(l),
                        None => clauses.push(Clause::new(std::mem::take(&mut clause))),
                    }
                }
            }
        }
    }

    let header = header.ok_or_else(|| DimacsParseError::Format("missing 'p' line before clauses".into()))?;
    // the final clause may leave out its 0
    if !clause.is_empty() {
        clauses.push(Clause::new(clause));
    }
    if clauses.len() != header.num_clauses {
        return Err(DimacsParseError::Format(format!(
            "header declares {} clauses but {} were read",
            header.num_clauses,
            clauses.len()
        )));
    }

    match header.convention {
        Convention::Dnf => Ok(Problem::Dnf(Formula::new(clauses))),
        Convention::Cnf => Ok(Problem::Cnf(Cnf::new(clauses))),
    }
}

fn parse_literal(s: &str) -> Result<Option<Literal>, DimacsParseError> {
    let l = s
        .parse::<i64>()
        .map_err(|_| DimacsParseError::Format(format!("invalid literal '{}'", s)))?;
    Ok(Literal::from_dimacs(l).ok())
}

pub fn write_dnf<W: Write>(mut writer: W, formula: &Formula) -> std::io::Result<()> {
    let num_variables = formula.max_variable().map_or(0, |v| v.0);
    writeln!(writer, "p dnf {} {}", num_variables, formula.num_clauses())?;
    write_clauses(writer, formula.clauses())
}

pub fn write_cnf<W: Write>(mut writer: W, cnf: &Cnf) -> std::io::Result<()> {
    let num_variables = cnf.max_variable().map_or(0, |v| v.0);
    writeln!(writer, "p cnf {} {}", num_variables, cnf.num_clauses())?;
    write_clauses(writer, cnf.clauses())
}

fn write_clauses<'a, W: Write>(mut writer: W, clauses: impl Iterator<Item = &'a Clause>) -> std::io::Result<()> {
    for clause in clauses {
        for literal in clause.literals() {
            write!(writer, "{} ", literal)?;
        }
        writeln!(writer, "0")?;
    }
    Ok(())
}

#[derive(Debug)]
pub enum DimacsParseError {
    Io(std::io::Error),
    Format(String),
}

impl From<std::io::Error> for DimacsParseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl Display for DimacsParseError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            DimacsParseError::Io(e) => write!(f, "i/o error: {}", e),
            DimacsParseError::Format(msg) => write!(f, "format error: {}", msg),
        }
    }
}

impl std::error::Error for DimacsParseError {}
