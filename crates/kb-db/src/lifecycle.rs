//! Save/delete lifecycle with automatic validation.
//!
//! [`save`] runs `clean -> pre_save -> write -> post_save` and [`delete`]
//! runs `pre_delete -> erase -> post_delete`. A validation failure raised by
//! `clean` is reported as [`Error::Integrity`]; every other error passes
//! through unchanged. When a step fails, the later steps do not run.

use kb_core::{Error, Result};
use rusqlite::Connection;

/// Hooks a model can override. All default to no-ops.
pub trait Lifecycle {
    /// Validate the model before it is written.
    fn clean(&self) -> Result<()> {
        Ok(())
    }

    fn pre_save(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_save(&mut self) -> Result<()> {
        Ok(())
    }

    fn pre_delete(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_delete(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Raw persistence of a model row.
pub trait Persist {
    /// Insert or update the row.
    fn write(&self, conn: &Connection) -> Result<()>;

    /// Remove the row. Returns false if it did not exist.
    fn erase(&self, conn: &Connection) -> Result<bool>;
}

/// Validate and persist `model`, running its save hooks around the write.
pub fn save<M: Lifecycle + Persist>(conn: &Connection, model: &mut M) -> Result<()> {
    model.clean().map_err(Error::into_integrity)?;
    model.pre_save()?;
    model.write(conn)?;
    model.post_save()
}

/// Remove `model`, running its delete hooks around the erase.
pub fn delete<M: Lifecycle + Persist>(conn: &Connection, model: &mut M) -> Result<bool> {
    model.pre_delete()?;
    let removed = model.erase(conn)?;
    model.post_delete()?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<&'static str>>,
        clean_error: Option<fn() -> Error>,
    }

    impl Recorder {
        fn events(&self) -> Vec<&'static str> {
            self.events.borrow().clone()
        }
    }

    impl Lifecycle for Recorder {
        fn clean(&self) -> Result<()> {
            self.events.borrow_mut().push("clean");
            match self.clean_error {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
        fn pre_save(&mut self) -> Result<()> {
            self.events.borrow_mut().push("pre_save");
            Ok(())
        }
        fn post_save(&mut self) -> Result<()> {
            self.events.borrow_mut().push("post_save");
            Ok(())
        }
        fn pre_delete(&mut self) -> Result<()> {
            self.events.borrow_mut().push("pre_delete");
            Ok(())
        }
        fn post_delete(&mut self) -> Result<()> {
            self.events.borrow_mut().push("post_delete");
            Ok(())
        }
    }

    impl Persist for Recorder {
        fn write(&self, _conn: &Connection) -> Result<()> {
            self.events.borrow_mut().push("write");
            Ok(())
        }
        fn erase(&self, _conn: &Connection) -> Result<bool> {
            self.events.borrow_mut().push("erase");
            Ok(true)
        }
    }

    #[test]
    fn save_then_delete_order() {
        let conn = Connection::open_in_memory().unwrap();
        let mut model = Recorder::default();

        save(&conn, &mut model).unwrap();
        assert!(delete(&conn, &mut model).unwrap());
        assert_eq!(
            model.events(),
            vec![
                "clean",
                "pre_save",
                "write",
                "post_save",
                "pre_delete",
                "erase",
                "post_delete"
            ]
        );
    }

    #[test]
    fn validation_failure_becomes_integrity_error() {
        let conn = Connection::open_in_memory().unwrap();
        let mut model = Recorder {
            clean_error: Some(|| Error::Validation("Invalid".into())),
            ..Default::default()
        };

        let err = save(&conn, &mut model).unwrap_err();
        assert!(matches!(err, Error::Integrity(ref m) if m == "Invalid"));
        assert_eq!(model.events(), vec!["clean"]);
    }

    #[test]
    fn other_clean_errors_stay_the_same() {
        let conn = Connection::open_in_memory().unwrap();
        let mut model = Recorder {
            clean_error: Some(|| Error::Internal("Invalid".into())),
            ..Default::default()
        };

        let err = save(&conn, &mut model).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
