use std::hash::Hash;

use hashbrown::HashSet;

use crate::puzzle::base::palette::ColorId;

pub fn pad(s: &str, max_size: usize, right: bool) -> String {
    let mut res = s.to_string();
    let s_len = res.len();
    if max_size > s_len {
        let spaces = " ".repeat(max_size - s_len);
        if right {
            res.push_str(spaces.as_str())
        } else {
            res.insert_str(0, spaces.as_str())
        }
    }
    res
}

pub fn pad_with<T: Clone>(v: &mut Vec<T>, el: T, max_size: usize, right: bool) {
    let v_len = v.len();
    if max_size > v_len {
        let plus = vec![el; max_size - v_len];

        if right {
            v.extend(plus);
        } else {
            let _ = v.splice(..0, plus);
        }
    }
}

pub fn transpose<T: Clone>(input: &[Vec<T>]) -> Result<Vec<Vec<T>>, String> {
    if input.is_empty() || input[0].is_empty() {
        return Ok(vec![]);
    }

    let sizes: Vec<usize> = input.iter().map(Vec::len).collect();
    let min_size = sizes.iter().min().unwrap_or(&0);
    let max_size = sizes.iter().max().unwrap_or(&0);

    if min_size != max_size {
        return Err(format!("Jagged matrix: {} vs {}", min_size, max_size));
    }

    Ok((0..input[0].len())
        .map(|j| input.iter().map(|row| row[j].clone()).collect())
        .collect())
}

/// Keep the first occurrence of every element, in the original order.
pub fn dedup<T>(vec: Vec<T>) -> Vec<T>
where
    T: Eq + Hash + Clone,
{
    let mut seen = HashSet::with_capacity(vec.len());
    vec.into_iter().filter(|x| seen.insert(x.clone())).collect()
}

/// Split a mask into the powers of two it is made of.
///
/// ```
/// use crosshatch::utils::two_powers;
///
/// assert_eq!(two_powers(0).collect::<Vec<_>>(), vec![]);
/// assert_eq!(two_powers(1).collect::<Vec<_>>(), vec![1]);
/// assert_eq!(two_powers(13).collect::<Vec<_>>(), vec![1, 4, 8]);
/// ```
pub fn two_powers(mut value: ColorId) -> impl Iterator<Item = ColorId> {
    std::iter::from_fn(move || {
        if value == 0 {
            None
        } else {
            let lowest = value & value.wrapping_neg();
            value &= !lowest;
            Some(lowest)
        }
    })
}

/// Merge single powers of two back into a mask.
pub fn from_two_powers(values: &[ColorId]) -> ColorId {
    values.iter().fold(0, |acc, &value| acc | value)
}

pub mod rc {
    use std::cell::{Ref, RefCell, RefMut};
    use std::fmt;
    use std::rc::Rc;

    /// Immutable shared data (frozen clues, cached lines).
    pub type ReadRc<T> = Rc<T>;
    pub type ReadRef<'a, T> = Ref<'a, T>;

    /// Shared mutable cell for the single-threaded solving pipeline.
    pub struct MutRc<T>(Rc<RefCell<T>>);

    impl<T> MutRc<T> {
        pub fn new(value: T) -> Self {
            Self(Rc::new(RefCell::new(value)))
        }

        pub fn read(&self) -> Ref<T> {
            self.0.borrow()
        }

        pub fn write(&self) -> RefMut<T> {
            self.0.borrow_mut()
        }
    }

    impl<T> Clone for MutRc<T> {
        fn clone(&self) -> Self {
            Self(Rc::clone(&self.0))
        }
    }

    impl<T: fmt::Debug> fmt::Debug for MutRc<T> {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "MutRc({:?})", self.0.borrow())
        }
    }
}

pub mod time {
    use std::time::{Duration, Instant};

    #[cfg(feature = "std_time")]
    pub fn now() -> Option<Instant> {
        Some(Instant::now())
    }

    /// On targets without a monotonic clock deadlines silently never expire.
    #[cfg(not(feature = "std_time"))]
    pub fn now() -> Option<Instant> {
        None
    }

    pub fn deadline(timeout_secs: Option<u32>) -> Option<Instant> {
        timeout_secs.and_then(|secs| now().map(|start| start + Duration::from_secs(secs.into())))
    }

    pub fn expired(deadline: Option<Instant>) -> bool {
        match (deadline, now()) {
            (Some(deadline), Some(current)) => current >= deadline,
            _ => false,
        }
    }
}
