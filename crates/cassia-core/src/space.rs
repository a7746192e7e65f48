//! Variable storage.
//!
//! Variables are identified by their slot in a [`Space`], never by value: two
//! variables holding the same number are still different unknowns. The space
//! is owned by the caller; solvers only hold [`Variable`] handles and write
//! values back on flush.

/// Handle to a variable slot in a [`Space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable(pub(crate) usize);

impl Variable {
    /// Index of the slot backing this variable.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A user-facing handle that owns exactly one variable and may carry a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param(pub(crate) Variable);

impl Param {
    /// The variable owned by this param.
    pub fn variable(self) -> Variable {
        self.0
    }
}

impl From<Param> for Variable {
    fn from(param: Param) -> Self {
        param.0
    }
}

#[derive(Debug, Clone)]
struct Slot<C> {
    value: f64,
    name: Option<String>,
    /// Set when the slot belongs to a param.
    owned: bool,
    context: Option<C>,
}

/// Arena of variables and param contexts.
///
/// `C` is the opaque context type attached to params and reported back by the
/// solver when the param's value is flushed.
#[derive(Debug, Clone)]
pub struct Space<C = ()> {
    slots: Vec<Slot<C>>,
}

impl<C> Default for Space<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Space<C> {
    /// Create an empty space.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Create a free-standing variable.
    pub fn new_variable(&mut self, value: f64) -> Variable {
        self.push(Slot {
            value,
            name: None,
            owned: false,
            context: None,
        })
    }

    /// Create a free-standing variable with a display name.
    pub fn new_named_variable(&mut self, name: impl Into<String>, value: f64) -> Variable {
        self.push(Slot {
            value,
            name: Some(name.into()),
            owned: false,
            context: None,
        })
    }

    /// Create a param without a context.
    pub fn new_param(&mut self, value: f64) -> Param {
        Param(self.push(Slot {
            value,
            name: None,
            owned: true,
            context: None,
        }))
    }

    /// Create a param carrying `context`.
    pub fn new_param_with_context(&mut self, value: f64, context: C) -> Param {
        Param(self.push(Slot {
            value,
            name: None,
            owned: true,
            context: Some(context),
        }))
    }

    fn push(&mut self, slot: Slot<C>) -> Variable {
        let var = Variable(self.slots.len());
        self.slots.push(slot);
        var
    }

    /// Number of variables in the space.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the space holds no variables.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current value of a variable.
    ///
    /// # Panics
    ///
    /// Panics if `var` was not created by this space.
    pub fn value(&self, var: impl Into<Variable>) -> f64 {
        self.slots[var.into().0].value
    }

    /// Overwrite a variable's value, returning whether it changed.
    ///
    /// # Panics
    ///
    /// Panics if `var` was not created by this space.
    pub fn set_value(&mut self, var: impl Into<Variable>, value: f64) -> bool {
        let slot = &mut self.slots[var.into().0];
        let changed = slot.value != value;
        slot.value = value;
        changed
    }

    /// Display name of a variable, if any.
    pub fn name(&self, var: impl Into<Variable>) -> Option<&str> {
        self.slots
            .get(var.into().0)
            .and_then(|slot| slot.name.as_deref())
    }

    /// Set the display name of a variable.
    pub fn set_name(&mut self, var: impl Into<Variable>, name: impl Into<String>) {
        if let Some(slot) = self.slots.get_mut(var.into().0) {
            slot.name = Some(name.into());
        }
    }

    /// The param owning `var`, if it was created through [`Space::new_param`].
    pub fn owner(&self, var: Variable) -> Option<Param> {
        self.slots
            .get(var.0)
            .filter(|slot| slot.owned)
            .map(|_| Param(var))
    }

    /// Context attached to a param.
    pub fn context(&self, param: Param) -> Option<&C> {
        self.slots.get(param.0 .0).and_then(|slot| slot.context.as_ref())
    }

    /// Attach or replace the context of a param.
    pub fn set_context(&mut self, param: Param, context: C) {
        if let Some(slot) = self.slots.get_mut(param.0 .0) {
            slot.context = Some(context);
        }
    }

    /// Iterate over all variables in creation order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        (0..self.slots.len()).map(Variable)
    }
}
