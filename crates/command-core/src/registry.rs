use crate::{Command, CommandError};

pub type Constructor<R> = fn(R) -> Box<dyn Command>;

pub struct ValidCommand<R> {
    pub name: &'static str,
    pub constructor: Constructor<R>,
}

impl<R> Clone for ValidCommand<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for ValidCommand<R> {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    pub name: &'static str,
    pub usage: String,
}

/// Name to constructor table. Names are unique and lookup is exact-match;
/// registration order is kept for help output.
pub struct Registry<R> {
    commands: Vec<ValidCommand<R>>,
}

impl<R> Default for Registry<R> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<R> Registry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &'static str,
        constructor: Constructor<R>,
    ) -> Result<(), CommandError> {
        if self.contains(name) {
            return Err(CommandError::DuplicateCommand(name.to_string()));
        }
        self.commands.push(ValidCommand { name, constructor });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Constructor<R>> {
        self.commands
            .iter()
            .find(|command| command.name == name)
            .map(|command| command.constructor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|command| command.name)
    }

    pub fn construct(constructor: Constructor<R>, resource: R) -> Box<dyn Command> {
        constructor(resource)
    }

    pub fn resolve(&self, name: &str, resource: R) -> Result<Box<dyn Command>, CommandError> {
        let constructor = self
            .lookup(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;
        Ok(Self::construct(constructor, resource))
    }
}

impl<R: Clone> Registry<R> {
    pub fn usages(&self, resource: &R) -> Vec<UsageEntry> {
        self.commands
            .iter()
            .map(|command| {
                let built = (command.constructor)(resource.clone());
                UsageEntry {
                    name: command.name,
                    usage: built.usage(),
                }
            })
            .collect()
    }
}
