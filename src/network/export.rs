//! Result records for solved models.

use crate::cp::{Assignment, CpModel, Shape, VarKind};
use crate::error::{ModelError, Result};

/// Values of one declared variable group, row-major, with its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultRecord {
    pub name: String,
    pub kind: VarKind,
    pub shape: Shape,
    pub values: Vec<i64>,
}

impl ResultRecord {
    /// Value at `[i]`, `[i][j]` or `[i][j][k]`; extra indices are ignored,
    /// missing ones count as 0.
    pub fn at(&self, index: &[usize]) -> Option<i64> {
        let ix = |n: usize| index.get(n).copied().unwrap_or(0);
        let flat = match self.shape {
            Shape::D1(_) => ix(0),
            Shape::D2(_, b) => ix(0) * b + ix(1),
            Shape::D3(_, b, c) => (ix(0) * b + ix(1)) * c + ix(2),
        };
        self.values.get(flat).copied()
    }
}

/// One record per group recorded in `model`, in declaration order.
pub fn export(model: &CpModel, assignment: &Assignment) -> Result<Vec<ResultRecord>> {
    model
        .groups()
        .iter()
        .map(|g| {
            let values = g
                .vars
                .iter()
                .map(|&v| {
                    assignment
                        .get(v)
                        .ok_or_else(|| ModelError::Unassigned(model.var_name(v).to_string()))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ResultRecord {
                name: g.name.clone(),
                kind: g.kind,
                shape: g.shape,
                values,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::Domain;

    #[test]
    fn test_export_matrix() {
        let mut m = CpModel::new("t");
        let x = m.int_matrix("x", 2, 2, |_, _| Domain::range(0, 9)).unwrap();
        let mut a = Assignment::for_model(&m);
        for (i, v) in x.iter().flatten().enumerate() {
            a.set(*v, i as i64);
        }
        let records = export(&m, &a).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].shape, Shape::D2(2, 2));
        assert_eq!(records[0].values, vec![0, 1, 2, 3]);
        assert_eq!(records[0].at(&[1, 0]), Some(2));
    }

    #[test]
    fn test_export_requires_values() {
        let mut m = CpModel::new("t");
        m.int_array("x", 2, |_| Domain::range(0, 9)).unwrap();
        let a = Assignment::for_model(&m);
        assert!(matches!(export(&m, &a), Err(ModelError::Unassigned(_))));
    }

    #[test]
    fn test_cube_index() {
        let r = ResultRecord {
            name: "c".into(),
            kind: VarKind::Bool,
            shape: Shape::D3(2, 2, 3),
            values: (0..12).collect(),
        };
        assert_eq!(r.at(&[1, 1, 2]), Some(11));
        assert_eq!(r.at(&[0, 1, 0]), Some(3));
    }
}
