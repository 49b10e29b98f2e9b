//! This module is for testing only

use std::cell::Cell;
use std::rc::Rc;

/// Counts how many [`Droppable`]s sharing it were dropped.
#[derive(Clone, Default)]
pub struct DropFlag(Rc<Cell<usize>>);

impl DropFlag {
    pub fn get(&self) -> usize {
        self.0.get()
    }
}

pub struct Droppable {
    pub value: i32,
    dropflag: DropFlag,
}

impl Droppable {
    pub fn new(dropflag: &DropFlag) -> Droppable {
        Droppable::with_value(dropflag, 0)
    }

    pub fn with_value(dropflag: &DropFlag, value: i32) -> Droppable {
        Droppable { value, dropflag: dropflag.clone() }
    }
}

impl Drop for Droppable {
    fn drop(&mut self) {
        let flag = &self.dropflag.0;
        flag.set(flag.get() + 1);
    }
}

#[test]
fn dropflag() {
    let flag = DropFlag::default();
    let droppable = Droppable::new(&flag);
    assert_eq!(0, flag.get());
    std::mem::drop(droppable);
    assert_eq!(1, flag.get());
}
