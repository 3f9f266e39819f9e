//! Polynomial evaluation with the coefficient count fixed at compile time.

/// Evaluate `c[0] + c[1]*x + ... + c[N-1]*x^(N-1)` by Horner's method.
///
/// An empty coefficient list evaluates to zero. At `x == 0` the result is
/// `c[0]` exactly, even when higher coefficients are infinite.
#[inline]
pub fn evalpoly<const N: usize>(c: &[f64; N], x: f64) -> f64 {
    let Some((&last, rest)) = c.split_last() else {
        return 0.0;
    };
    if x == 0.0 {
        return c[0];
    }
    rest.iter().rev().fold(last, |acc, &ck| acc * x + ck)
}

/// Expand a fixed polynomial into nested multiply-adds.
///
/// `horner!(x; c0, c1, c2)` is `c0 + x * (c1 + x * c2)`, evaluating `x`
/// once.
#[macro_export]
macro_rules! horner {
    ($x:expr; $c:expr) => {
        $c
    };
    ($x:expr; $c:expr, $($rest:expr),+ $(,)?) => {{
        let x = $x;
        $c + x * $crate::horner!(x; $($rest),+)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_evalpoly() {
        assert_eq!(evalpoly(&[], 3.0), 0.0);
        assert_eq!(evalpoly(&[4.0], 3.0), 4.0);
        assert_eq!(evalpoly(&[1.0, 2.0, 3.0], 2.0), 17.0);
        assert_eq!(evalpoly(&[1.0, f64::INFINITY], 0.0), 1.0);
    }

    #[test]
    fn test_horner_matches_evalpoly() {
        const C: [f64; 4] = [0.5, -1.25, 3.0, 0.125];
        for &x in &[-2.0, -0.3, 0.7, 5.0] {
            let h = horner!(x; C[0], C[1], C[2], C[3]);
            assert_relative_eq!(h, evalpoly(&C, x), max_relative = 1e-15);
        }
        assert_eq!(horner!(2.0; 7.0), 7.0);
    }
}
