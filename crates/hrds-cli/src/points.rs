//! Reading and writing point lists.

use anyhow::{bail, Context, Result};
use hrds::Point;
use std::io::{BufRead, Write};

/// Parse a point written as `x,y`.
pub fn parse_point(s: &str) -> Result<Point> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("expected X,Y but got '{}'", s))?;
    Ok(Point::new(
        x.trim().parse().with_context(|| format!("invalid x in '{}'", s))?,
        y.trim().parse().with_context(|| format!("invalid y in '{}'", s))?,
    ))
}

/// Read one `x y` (or `x,y`) point per line. Blank lines and lines starting
/// with `#` are skipped.
pub fn read_points<R: BufRead>(reader: R) -> Result<Vec<Point>> {
    let mut points = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() < 2 {
            bail!("line {}: expected two coordinates, got '{}'", n + 1, line);
        }
        let x = fields[0]
            .parse()
            .with_context(|| format!("line {}: invalid x '{}'", n + 1, fields[0]))?;
        let y = fields[1]
            .parse()
            .with_context(|| format!("line {}: invalid y '{}'", n + 1, fields[1]))?;
        points.push(Point::new(x, y));
    }
    Ok(points)
}

/// Write `x y value` lines; failed points are written with `nan`.
pub fn write_values<W: Write>(mut out: W, points: &[Point], values: &[Option<f64>]) -> Result<()> {
    for (p, v) in points.iter().zip(values) {
        writeln!(out, "{} {} {}", p.x, p.y, v.unwrap_or(f64::NAN))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1.5,-2").unwrap(), Point::new(1.5, -2.0));
        assert_eq!(parse_point(" 3 , 4 ").unwrap(), Point::new(3.0, 4.0));
        assert!(parse_point("3 4").is_err());
        assert!(parse_point("a,4").is_err());
    }

    #[test]
    fn test_read_points() {
        let input = "# x y\n1 2\n\n3,4\n  5\t6  \n";
        let points = read_points(input.as_bytes()).unwrap();
        assert_eq!(
            points,
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0), Point::new(5.0, 6.0)]
        );

        let err = read_points("1\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_write_values() {
        let mut out = Vec::new();
        write_values(
            &mut out,
            &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
            &[Some(80.0), None],
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 2 80\n3 4 NaN\n");
    }
}
