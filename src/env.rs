use std::cell::RefCell;

/// Settings read from the process environment once, at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Env {
    /// `LMC_TRACE=1`: print every executed instruction while running to completion.
    pub trace: bool,
    /// `LMC_NO_COLOR=1`: never colour output.
    pub no_color: bool,
}

impl Env {
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_set = |name: &str| lookup(name).is_some_and(|v| v == "1");
        Env {
            trace: is_set("LMC_TRACE"),
            no_color: is_set("LMC_NO_COLOR"),
        }
    }
}

thread_local! {
    /// Must only be mutated within `init`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() -> Env {
    let value = Env::from_lookup(|name| std::env::var(name).ok());
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
    value
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace)
}

pub fn is_color_disabled() -> bool {
    with_env(|env| env.no_color)
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_flags() {
        let env = Env::from_lookup(|name| match name {
            "LMC_TRACE" => Some("1".to_string()),
            "LMC_NO_COLOR" => Some("yes".to_string()),
            _ => None,
        });
        assert_eq!(
            env,
            Env {
                trace: true,
                no_color: false
            }
        );
        assert_eq!(Env::from_lookup(|_| None), Env::default());
    }
}
