use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Atom count mismatch: header declares {declared} atoms but {found} were read")]
    CountMismatch { declared: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Missing atom count line")]
    MissingCount,
    #[error("Invalid atom count (value: '{0}')")]
    InvalidCount(String),
    #[error("Atom line needs an element and three coordinates")]
    TooFewFields,
    #[error("Invalid {axis} coordinate (value: '{value}')")]
    InvalidCoordinate { axis: char, value: String },
}

pub struct XyzFile;

impl MolecularFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut lines = reader.lines();

        let count_line = lines.next().transpose()?.ok_or(XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::MissingCount,
        })?;
        let declared: usize = count_line.trim().parse().map_err(|_| XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::InvalidCount(count_line.trim().to_string()),
        })?;

        let title = lines.next().transpose()?.unwrap_or_default();
        let mut structure = Structure::new(title.trim_end());

        for (offset, line_res) in lines.enumerate() {
            if structure.len() == declared {
                break;
            }
            let line = line_res?;
            let line_num = offset + 3;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(XyzError::Parse {
                    line: line_num,
                    kind: XyzParseErrorKind::TooFewFields,
                });
            }

            let parse_axis = |axis: char, value: &str| -> Result<f64, XyzError> {
                value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| XyzError::Parse {
                        line: line_num,
                        kind: XyzParseErrorKind::InvalidCoordinate {
                            axis,
                            value: value.to_string(),
                        },
                    })
            };
            let x = parse_axis('x', fields[1])?;
            let y = parse_axis('y', fields[2])?;
            let z = parse_axis('z', fields[3])?;

            structure.add_atom(Atom::new(fields[0], Point3::new(x, y, z)));
        }

        if structure.len() != declared {
            return Err(XyzError::CountMismatch {
                declared,
                found: structure.len(),
            });
        }

        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "{}", structure.len())?;
        writeln!(writer, "{}", structure.title.replace('\n', " "))?;
        for atom in structure.atoms() {
            let p = atom.position;
            writeln!(
                writer,
                "{} {:.6} {:.6} {:.6}",
                atom.element, p.x, p.y, p.z
            )?;
        }
        Ok(())
    }
}
