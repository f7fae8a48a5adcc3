//! Strict reader for the two-section vertex/element text format.
//!
//! ```text
//! N                  vertex count
//! M                  element count
//! x y z              } repeated N times: 3D position
//! l0 l1 ... l7       }                   lifted coordinate
//! i0 i1 ...          repeated M times: K vertex indices
//! ```
//!
//! Every declared line must be present and well formed. Blank lines after
//! the last element are tolerated, anything else there is an error.

use mimic_math::{LiftedPoint, Point3, LIFTED_DIM};

use crate::error::{LoadError, Result};

/// Parsed contents of a vertex/element file.
#[derive(Debug, Clone)]
pub(crate) struct Sections<const K: usize> {
    pub positions: Vec<Point3>,
    pub lifted: Vec<LiftedPoint>,
    pub elements: Vec<[u32; K]>,
}

/// Parse a file whose elements have `K` vertices.
///
/// `element` names the element kind in error messages.
pub(crate) fn parse_sections<const K: usize>(
    text: &str,
    element: &'static str,
) -> Result<Sections<K>> {
    let lines: Vec<&str> = text.lines().collect();

    let n = parse_count(&lines, 0, "vertex")?;
    let m = parse_count(&lines, 1, element)?;

    let expected = 2 + 2 * n + m;
    if lines.len() < expected {
        return Err(LoadError::Truncated {
            expected,
            found: lines.len(),
        });
    }
    if let Some(offset) = lines[expected..].iter().position(|l| !l.trim().is_empty()) {
        return Err(LoadError::TrailingData {
            line: expected + offset + 1,
        });
    }

    let mut positions = Vec::with_capacity(n);
    let mut lifted = Vec::with_capacity(n);
    for v in 0..n {
        let row = 2 + 2 * v;
        let xyz: [f64; 3] = parse_row(lines[row], row + 1)?;
        positions.push(Point3::new(xyz[0], xyz[1], xyz[2]));
        let l: [f64; LIFTED_DIM] = parse_row(lines[row + 1], row + 2)?;
        lifted.push(LiftedPoint::from(l));
    }

    let mut elements = Vec::with_capacity(m);
    for e in 0..m {
        let row = 2 + 2 * n + e;
        let idx: [u32; K] = parse_row(lines[row], row + 1)?;
        if let Some(&bad) = idx.iter().find(|&&i| i as usize >= n) {
            return Err(LoadError::IndexOutOfRange {
                element,
                index: e,
                vertex: bad as usize,
                count: n,
            });
        }
        elements.push(idx);
    }

    Ok(Sections {
        positions,
        lifted,
        elements,
    })
}

fn parse_count(lines: &[&str], row: usize, what: &'static str) -> Result<usize> {
    let line = lines
        .get(row)
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .ok_or(LoadError::MissingHeader { what })?;
    line.parse()
        .map_err(|_| LoadError::parse(row + 1, format!("invalid {what} count '{line}'")))
}

/// Parse exactly `N` whitespace-separated values from one line.
fn parse_row<T, const N: usize>(line: &str, line_no: usize) -> Result<[T; N]>
where
    T: std::str::FromStr + Copy + Default,
{
    let mut out = [T::default(); N];
    let mut found = 0;
    for token in line.split_whitespace() {
        if found == N {
            return Err(LoadError::parse(
                line_no,
                format!("expected {N} values, found more"),
            ));
        }
        out[found] = token
            .parse()
            .map_err(|_| LoadError::parse(line_no, format!("invalid value '{token}'")))?;
        found += 1;
    }
    if found != N {
        return Err(LoadError::parse(
            line_no,
            format!("expected {N} values, found {found}"),
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_VERTS: &str = "\
2
1
0 0 0
0 0 0 0 0 0 0 0
1 2 3
1 2 3 4 5 6 7 8
0 1 1
";

    #[test]
    fn test_parse_well_formed() {
        let s = parse_sections::<3>(TWO_VERTS, "triangle").unwrap();
        assert_eq!(s.positions.len(), 2);
        assert_eq!(s.positions[1], Point3::new(1.0, 2.0, 3.0));
        assert_eq!(s.lifted[1][7], 8.0);
        assert_eq!(s.elements, vec![[0, 1, 1]]);
    }

    #[test]
    fn test_trailing_blank_lines_ok() {
        let text = format!("{TWO_VERTS}\n   \n");
        assert!(parse_sections::<3>(&text, "triangle").is_ok());
    }

    #[test]
    fn test_rejects_truncated_and_trailing() {
        let truncated = "2\n1\n0 0 0\n0 0 0 0 0 0 0 0\n";
        assert!(matches!(
            parse_sections::<3>(truncated, "triangle"),
            Err(LoadError::Truncated {
                expected: 7,
                found: 4
            })
        ));

        let trailing = format!("{TWO_VERTS}0 1 0\n");
        assert!(matches!(
            parse_sections::<3>(&trailing, "triangle"),
            Err(LoadError::TrailingData { line: 8 })
        ));
    }

    #[test]
    fn test_rejects_bad_rows() {
        let short_lift = TWO_VERTS.replace("1 2 3 4 5 6 7 8", "1 2 3 4 5 6 7");
        assert!(matches!(
            parse_sections::<3>(&short_lift, "triangle"),
            Err(LoadError::Parse { line: 6, .. })
        ));

        let long_elem = TWO_VERTS.replace("0 1 1", "0 1 1 0");
        assert!(matches!(
            parse_sections::<3>(&long_elem, "triangle"),
            Err(LoadError::Parse { line: 7, .. })
        ));

        let bad_index = TWO_VERTS.replace("0 1 1", "0 1 2");
        assert!(matches!(
            parse_sections::<3>(&bad_index, "triangle"),
            Err(LoadError::IndexOutOfRange { vertex: 2, .. })
        ));

        let negative = TWO_VERTS.replace("0 1 1", "0 -1 1");
        assert!(matches!(
            parse_sections::<3>(&negative, "triangle"),
            Err(LoadError::Parse { line: 7, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(
            parse_sections::<4>("", "tet"),
            Err(LoadError::MissingHeader { what: "vertex" })
        ));
        assert!(matches!(
            parse_sections::<4>("3\n", "tet"),
            Err(LoadError::MissingHeader { what: "tet" })
        ));
        assert!(matches!(
            parse_sections::<4>("three\n1\n", "tet"),
            Err(LoadError::Parse { line: 1, .. })
        ));
    }
}
