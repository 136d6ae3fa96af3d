//! The element graph store
//!
//! Provides [`Database`]: the authoritative name index, the id index, the
//! recipe edges and the user registry of one community.
//!
//! All state sits behind one `RwLock`. Mutating calls validate the whole
//! change under the write lock before touching anything, so concurrent
//! readers never observe a partially applied change.

use crate::error::DatabaseError;
use crate::mutation::{Applied, Mutation};
use eod_model::{
    AttributeCredits, CollaboratorSet, Combination, Element, ElementAttributes, ElementId,
    ElementName, ElementRef, User, UserId, MAX_COLLABORATORS, ORIGIN_TIMESTAMP,
};
use indexmap::IndexSet;
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::{BTreeSet, HashMap};

/// Graph state guarded by the database lock
#[derive(Debug, Default)]
pub(crate) struct GraphState {
    /// id -> element
    pub(crate) elements: HashMap<ElementId, Element>,
    /// folded name -> id
    pub(crate) by_name: HashMap<String, ElementId>,
    /// combination -> output
    pub(crate) recipes: HashMap<Combination, ElementId>,
    /// output -> combinations that make it
    pub(crate) made_with: HashMap<ElementId, Vec<Combination>>,
    /// input -> outputs it takes part in
    pub(crate) used_in: HashMap<ElementId, BTreeSet<ElementId>>,
    /// registered users
    pub(crate) users: HashMap<UserId, User>,
    /// starter elements, in seeding order
    pub(crate) starters: Vec<ElementId>,
    /// next id to hand out
    pub(crate) next_id: u64,
}

impl GraphState {
    fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub(crate) fn resolve(&self, reference: &ElementRef) -> Option<ElementId> {
        match reference {
            ElementRef::Id(id) => self.elements.contains_key(id).then_some(*id),
            ElementRef::Name(name) => self.by_name.get(&ElementName::fold(name)).copied(),
        }
    }

    pub(crate) fn get(&self, reference: &ElementRef) -> Result<&Element, DatabaseError> {
        self.resolve(reference)
            .and_then(|id| self.elements.get(&id))
            .ok_or_else(|| DatabaseError::ElementNotFound(reference.to_string()))
    }

    fn get_by_id(&self, id: ElementId) -> Result<&Element, DatabaseError> {
        self.elements
            .get(&id)
            .ok_or_else(|| DatabaseError::ElementNotFound(id.to_string()))
    }

    fn get_by_id_mut(&mut self, id: ElementId) -> Result<&mut Element, DatabaseError> {
        self.elements
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::ElementNotFound(id.to_string()))
    }

    /// Check a combination can be linked: inputs exist and it is unused
    fn check_recipe_free(&self, combination: &Combination) -> Result<(), DatabaseError> {
        for input in combination.distinct() {
            self.get_by_id(input)?;
        }
        if let Some(output) = self.recipes.get(combination) {
            return Err(DatabaseError::RecipeExists {
                combination: combination.clone(),
                output: *output,
            });
        }
        Ok(())
    }

    fn link_recipe(&mut self, combination: Combination, output: ElementId) {
        for input in combination.distinct() {
            self.used_in.entry(input).or_default().insert(output);
        }
        self.made_with
            .entry(output)
            .or_default()
            .push(combination.clone());
        self.recipes.insert(combination, output);
    }

    fn user_entry(&mut self, id: UserId) -> &mut User {
        self.users.entry(id).or_insert_with(|| User::new(id))
    }

    /// Validate then insert a new element
    pub(crate) fn insert_element(
        &mut self,
        name: ElementName,
        author: Option<UserId>,
        attrs: ElementAttributes,
        created: i64,
    ) -> Result<Element, DatabaseError> {
        let key = name.key();
        if self.by_name.contains_key(&key) {
            return Err(DatabaseError::DuplicateName(name.to_string()));
        }
        if let Some(origin) = &attrs.origin {
            self.check_recipe_free(origin)?;
        }
        let id = ElementId(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| DatabaseError::Internal("element id space exhausted".to_string()))?;

        // Validation done; from here on nothing fails
        self.next_id = next_id;
        let credits = AttributeCredits {
            marker: attrs.mark.as_ref().and(author),
            colorer: attrs.color.as_ref().and(author),
            imager: attrs.image.as_ref().and(author),
            iconer: attrs.icon.as_ref().and(author),
        };
        let element = Element {
            id,
            name,
            author,
            extra_authors: IndexSet::new(),
            mark: attrs.mark,
            color: attrs.color,
            image: attrs.image,
            icon: attrs.icon,
            created,
            origin: attrs.origin.clone(),
            credits,
        };
        self.elements.insert(id, element.clone());
        self.by_name.insert(key, id);
        if let Some(origin) = attrs.origin {
            self.link_recipe(origin, id);
        }
        if let Some(author) = author {
            self.user_entry(author).grant(id);
        }
        Ok(element)
    }

    fn check_add_collaborators(
        &self,
        target: ElementId,
        users: &CollaboratorSet,
        system_user: Option<UserId>,
    ) -> Result<(), DatabaseError> {
        let element = self.get_by_id(target)?;
        let author = element.author.ok_or(DatabaseError::NotUserCreated(target))?;
        for user in users.iter() {
            if Some(user) == system_user {
                return Err(DatabaseError::SystemAccount(user));
            }
            if user == author {
                return Err(DatabaseError::IsAuthor {
                    element: target,
                    user,
                });
            }
            if element.extra_authors.contains(&user) {
                return Err(DatabaseError::AlreadyCollaborator {
                    element: target,
                    user,
                });
            }
        }
        let count = element.extra_authors.len() + users.len();
        if count > MAX_COLLABORATORS {
            return Err(DatabaseError::TooManyCollaborators {
                element: target,
                count,
                max: MAX_COLLABORATORS,
            });
        }
        Ok(())
    }

    fn check_remove_collaborators(
        &self,
        target: ElementId,
        users: &CollaboratorSet,
    ) -> Result<(), DatabaseError> {
        let element = self.get_by_id(target)?;
        if let Some(user) = users.iter().find(|u| !element.extra_authors.contains(u)) {
            return Err(DatabaseError::NotCollaborator {
                element: target,
                user,
            });
        }
        Ok(())
    }
}

/// Element graph, recipe edges and user registry of one community
///
/// # Example
///
/// ```rust
/// use eod_database::Database;
/// use eod_model::{ElementAttributes, ElementName, UserId};
///
/// let db = Database::new(["Water", "Air"].map(|n| ElementName::new(n).unwrap()), None).unwrap();
/// assert!(db.has_element("WATER"));
///
/// let fire = db
///     .create_element(ElementName::new("Fire").unwrap(), Some(UserId(1)), ElementAttributes::new())
///     .unwrap();
/// assert!(db.has_element("fire"));
/// assert_eq!(db.lookup("#3").unwrap().id, fire.id);
/// ```
#[derive(Debug)]
pub struct Database {
    state: RwLock<GraphState>,
    system_user: Option<UserId>,
}

impl Database {
    /// Create a database seeded with starter elements
    ///
    /// Starters get ids `1..=n` in the given order, no author and the
    /// [`ORIGIN_TIMESTAMP`].
    ///
    /// # Errors
    /// `DatabaseError::DuplicateName` if two starters fold to the same name
    pub fn new(
        starters: impl IntoIterator<Item = ElementName>,
        system_user: Option<UserId>,
    ) -> Result<Self, DatabaseError> {
        let mut state = GraphState::new();
        for name in starters {
            let element =
                state.insert_element(name, None, ElementAttributes::new(), ORIGIN_TIMESTAMP)?;
            state.starters.push(element.id);
        }
        tracing::debug!(starters = state.starters.len(), "database seeded");
        Ok(Self::from_state(state, system_user))
    }

    /// Create a database with no elements at all
    #[inline]
    #[must_use]
    pub fn empty(system_user: Option<UserId>) -> Self {
        Self::from_state(GraphState::new(), system_user)
    }

    pub(crate) fn from_state(state: GraphState, system_user: Option<UserId>) -> Self {
        Self {
            state: RwLock::new(state),
            system_user,
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read()
    }

    /// Account that can never be credited on an element
    #[inline]
    #[must_use]
    pub fn system_user(&self) -> Option<UserId> {
        self.system_user
    }

    /// Case-insensitive name check
    #[must_use]
    pub fn has_element(&self, name: &str) -> bool {
        self.read().by_name.contains_key(&ElementName::fold(name))
    }

    /// Look up an element by name (case-insensitive) or id
    ///
    /// # Errors
    /// `DatabaseError::ElementNotFound` if absent
    pub fn lookup(&self, reference: impl Into<ElementRef>) -> Result<Element, DatabaseError> {
        let reference = reference.into();
        self.read().get(&reference).cloned()
    }

    /// Look up several elements under one consistent read
    ///
    /// # Errors
    /// `DatabaseError::ElementNotFound` for the first missing reference
    pub fn lookup_all<R>(
        &self,
        references: impl IntoIterator<Item = R>,
    ) -> Result<Vec<Element>, DatabaseError>
    where
        R: Into<ElementRef>,
    {
        let state = self.read();
        references
            .into_iter()
            .map(|r| state.get(&r.into()).cloned())
            .collect()
    }

    /// Create a new element
    ///
    /// Allocates the next id and inserts into both indices. When
    /// `attrs.origin` is set the recipe edge is registered in the same step.
    /// The author receives the element in their inventory.
    ///
    /// Elements other than starters must only be created while applying an
    /// accepted poll.
    ///
    /// # Errors
    /// - `DatabaseError::DuplicateName` on a case-insensitive name collision
    /// - `DatabaseError::ElementNotFound` / `RecipeExists` for a bad origin
    pub fn create_element(
        &self,
        name: ElementName,
        author: Option<UserId>,
        attrs: ElementAttributes,
    ) -> Result<Element, DatabaseError> {
        let element = self
            .state
            .write()
            .insert_element(name, author, attrs, now_timestamp())?;
        tracing::info!(element = %element.name, id = %element.id, "element created");
        Ok(element)
    }

    /// Apply one mutation atomically
    ///
    /// Collaborator rules are enforced here: adding someone who already
    /// collaborates, the author, or the system account is rejected, as is
    /// removing a non-collaborator or exceeding the cap. Either the full
    /// change lands or none of it does.
    ///
    /// # Errors
    /// Any [`DatabaseError`]; the database is unchanged when one is returned
    pub fn apply_mutation(&self, mutation: &Mutation) -> Result<Applied, DatabaseError> {
        let mut state = self.state.write();
        let applied = match mutation {
            Mutation::SetMark { target, mark, by } => {
                let element = state.get_by_id_mut(*target)?;
                element.mark = Some(mark.clone());
                element.credits.marker = Some(*by);
                Applied::Updated(element.clone())
            }
            Mutation::SetColor { target, color, by } => {
                let element = state.get_by_id_mut(*target)?;
                element.color = Some(color.clone());
                element.credits.colorer = Some(*by);
                Applied::Updated(element.clone())
            }
            Mutation::SetImage { target, image, by } => {
                let element = state.get_by_id_mut(*target)?;
                element.image = Some(image.clone());
                element.credits.imager = Some(*by);
                Applied::Updated(element.clone())
            }
            Mutation::SetIcon { target, icon, by } => {
                let element = state.get_by_id_mut(*target)?;
                element.icon = Some(icon.clone());
                element.credits.iconer = Some(*by);
                Applied::Updated(element.clone())
            }
            Mutation::AddCollaborators { target, users } => {
                state.check_add_collaborators(*target, users, self.system_user)?;
                for user in users.iter() {
                    state.user_entry(user);
                }
                let element = state.get_by_id_mut(*target)?;
                element.extra_authors.extend(users.iter());
                Applied::Updated(element.clone())
            }
            Mutation::RemoveCollaborators { target, users } => {
                state.check_remove_collaborators(*target, users)?;
                let element = state.get_by_id_mut(*target)?;
                for user in users.iter() {
                    element.extra_authors.shift_remove(&user);
                }
                Applied::Updated(element.clone())
            }
            Mutation::AddRecipe {
                combination,
                output,
            } => {
                state.get_by_id(*output)?;
                state.check_recipe_free(combination)?;
                state.link_recipe(combination.clone(), *output);
                Applied::Linked {
                    combination: combination.clone(),
                    output: state.get_by_id(*output)?.clone(),
                }
            }
            Mutation::CreateElement {
                combination,
                name,
                author,
            } => {
                let attrs = ElementAttributes::new().with_origin(combination.clone());
                let element =
                    state.insert_element(name.clone(), Some(*author), attrs, now_timestamp())?;
                Applied::Created(element)
            }
        };
        drop(state);

        tracing::info!(
            op = mutation.label(),
            element = %applied.element().name,
            "mutation applied"
        );
        Ok(applied)
    }

    /// Output of a combination, if a recipe exists
    #[must_use]
    pub fn find_recipe(&self, combination: &Combination) -> Option<Element> {
        let state = self.read();
        state
            .recipes
            .get(combination)
            .and_then(|id| state.elements.get(id))
            .cloned()
    }

    /// Return the user, registering them with an empty inventory first if new
    pub fn login(&self, id: UserId) -> User {
        if let Some(user) = self.read().users.get(&id) {
            return user.clone();
        }
        let mut state = self.state.write();
        let user = state.user_entry(id).clone();
        drop(state);
        tracing::debug!(user = %id, "user registered");
        user
    }

    /// Registered user, if any
    #[must_use]
    pub fn user(&self, id: UserId) -> Option<User> {
        self.read().users.get(&id).cloned()
    }

    /// Add an element to a user's inventory
    ///
    /// Returns false if the user already had it.
    ///
    /// # Errors
    /// - `DatabaseError::UserNotFound` if the user never logged in
    /// - `DatabaseError::ElementNotFound` if the element does not exist
    pub fn grant(&self, user: UserId, element: ElementId) -> Result<bool, DatabaseError> {
        let mut state = self.state.write();
        state.get_by_id(element)?;
        let user = state
            .users
            .get_mut(&user)
            .ok_or(DatabaseError::UserNotFound(user))?;
        Ok(user.grant(element))
    }

    /// Starter element ids, in seeding order
    #[must_use]
    pub fn starter_ids(&self) -> Vec<ElementId> {
        self.read().starters.clone()
    }

    /// Whether `id` is a starter element
    #[must_use]
    pub fn is_starter(&self, id: ElementId) -> bool {
        self.read().starters.contains(&id)
    }

    /// All elements, ordered by id
    #[must_use]
    pub fn elements(&self) -> Vec<Element> {
        let state = self.read();
        let mut elements: Vec<Element> = state.elements.values().cloned().collect();
        elements.sort_by_key(|e| e.id);
        elements
    }

    /// Number of elements
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.read().elements.len()
    }

    /// Number of recipe edges
    #[must_use]
    pub fn recipe_count(&self) -> usize {
        self.read().recipes.len()
    }

    /// Number of registered users
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.read().users.len()
    }
}

fn now_timestamp() -> i64 {
    // Never collide with the origin sentinel
    chrono::Utc::now().timestamp().max(ORIGIN_TIMESTAMP + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eod_model::{HexColor, Mark};
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> ElementName {
        ElementName::new(s).unwrap()
    }

    fn seeded() -> Database {
        Database::new(
            ["Air", "Earth", "Water"].map(name),
            Some(UserId(999)),
        )
        .unwrap()
    }

    fn user_element(db: &Database, n: &str, author: u64) -> Element {
        db.create_element(name(n), Some(UserId(author)), ElementAttributes::new())
            .unwrap()
    }

    #[test]
    fn starters_are_origin_elements() {
        let db = seeded();
        assert_eq!(db.element_count(), 3);
        assert_eq!(db.starter_ids(), vec![ElementId(1), ElementId(2), ElementId(3)]);
        let water = db.lookup("water").unwrap();
        assert!(water.is_origin());
        assert_eq!(water.author, None);
        assert!(db.is_starter(water.id));

        let steam = user_element(&db, "Steam", 4);
        assert!(!db.is_starter(steam.id));
    }

    #[test]
    fn duplicate_starters_rejected() {
        let err = Database::new(["Air", "AIR"].map(name), None).unwrap_err();
        assert_eq!(err, DatabaseError::DuplicateName("AIR".to_string()));
    }

    #[test]
    fn create_is_case_insensitive_unique() {
        let db = seeded();
        let fire = user_element(&db, "Fire", 1);
        assert!(db.has_element("FIRE"));
        assert_eq!(fire.id, ElementId(4));
        assert!(!fire.is_origin());

        let err = db
            .create_element(name("fire"), Some(UserId(2)), ElementAttributes::new())
            .unwrap_err();
        assert_eq!(err, DatabaseError::DuplicateName("fire".to_string()));
        assert_eq!(db.element_count(), 4);
    }

    #[test]
    fn ids_strictly_increase() {
        let db = seeded();
        let a = user_element(&db, "A", 1);
        let b = user_element(&db, "B", 1);
        assert!(b.id > a.id);
    }

    #[test]
    fn lookup_by_id_and_missing() {
        let db = seeded();
        assert_eq!(db.lookup(ElementId(2)).unwrap().name.as_str(), "Earth");
        assert_eq!(db.lookup("#2").unwrap().name.as_str(), "Earth");
        assert_eq!(
            db.lookup("Plasma").unwrap_err(),
            DatabaseError::ElementNotFound("Plasma".to_string())
        );
        assert!(db.lookup(ElementId(77)).unwrap_err().is_not_found());
    }

    #[test]
    fn author_receives_created_element() {
        let db = seeded();
        let fire = user_element(&db, "Fire", 5);
        assert!(db.user(UserId(5)).unwrap().has(fire.id));
    }

    #[test]
    fn set_attributes_record_credits() {
        let db = seeded();
        let applied = db
            .apply_mutation(&Mutation::SetColor {
                target: ElementId(3),
                color: HexColor::parse("#00ffaa").unwrap(),
                by: UserId(4),
            })
            .unwrap();
        assert_eq!(applied.element().color.as_ref().unwrap().as_str(), "#00ffaa");
        assert_eq!(applied.element().credits.colorer, Some(UserId(4)));

        db.apply_mutation(&Mutation::SetMark {
            target: ElementId(3),
            mark: Mark::new("wet").unwrap(),
            by: UserId(6),
        })
        .unwrap();
        let water = db.lookup("Water").unwrap();
        assert_eq!(water.mark.unwrap().as_str(), "wet");
        assert_eq!(water.credits.marker, Some(UserId(6)));
    }

    #[test]
    fn add_collaborators_enforces_rules() {
        let db = seeded();
        let fire = user_element(&db, "Fire", 1);
        let add = |ids: &[u64]| Mutation::AddCollaborators {
            target: fire.id,
            users: CollaboratorSet::new(ids.iter().copied().map(UserId)).unwrap(),
        };

        db.apply_mutation(&add(&[2, 3])).unwrap();
        assert_eq!(
            db.lookup(fire.id).unwrap().extra_authors.iter().copied().collect::<Vec<_>>(),
            vec![UserId(2), UserId(3)]
        );

        // Same collaborator again: rejected, nothing changes
        assert_eq!(
            db.apply_mutation(&add(&[4, 2])).unwrap_err(),
            DatabaseError::AlreadyCollaborator {
                element: fire.id,
                user: UserId(2)
            }
        );
        assert_eq!(db.lookup(fire.id).unwrap().extra_authors.len(), 2);

        assert!(matches!(
            db.apply_mutation(&add(&[1])).unwrap_err(),
            DatabaseError::IsAuthor { .. }
        ));
        assert_eq!(
            db.apply_mutation(&add(&[999])).unwrap_err(),
            DatabaseError::SystemAccount(UserId(999))
        );
    }

    #[test]
    fn starters_take_no_collaborators() {
        let db = seeded();
        let err = db
            .apply_mutation(&Mutation::AddCollaborators {
                target: ElementId(1),
                users: CollaboratorSet::new([UserId(2)]).unwrap(),
            })
            .unwrap_err();
        assert_eq!(err, DatabaseError::NotUserCreated(ElementId(1)));
    }

    #[test]
    fn collaborator_cap() {
        let db = seeded();
        let fire = user_element(&db, "Fire", 1);
        db.apply_mutation(&Mutation::AddCollaborators {
            target: fire.id,
            users: CollaboratorSet::new((10..18).map(UserId)).unwrap(),
        })
        .unwrap();
        let err = db
            .apply_mutation(&Mutation::AddCollaborators {
                target: fire.id,
                users: CollaboratorSet::new((20..23).map(UserId)).unwrap(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            DatabaseError::TooManyCollaborators {
                element: fire.id,
                count: 11,
                max: MAX_COLLABORATORS
            }
        );
        assert_eq!(db.lookup(fire.id).unwrap().extra_authors.len(), 8);
    }

    #[test]
    fn remove_non_collaborator_leaves_set_unchanged() {
        let db = seeded();
        let fire = user_element(&db, "Fire", 1);
        db.apply_mutation(&Mutation::AddCollaborators {
            target: fire.id,
            users: CollaboratorSet::new([UserId(2), UserId(3), UserId(4)]).unwrap(),
        })
        .unwrap();

        let err = db
            .apply_mutation(&Mutation::RemoveCollaborators {
                target: fire.id,
                users: CollaboratorSet::new([UserId(3), UserId(8)]).unwrap(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            DatabaseError::NotCollaborator {
                element: fire.id,
                user: UserId(8)
            }
        );
        assert_eq!(db.lookup(fire.id).unwrap().extra_authors.len(), 3);

        db.apply_mutation(&Mutation::RemoveCollaborators {
            target: fire.id,
            users: CollaboratorSet::new([UserId(3)]).unwrap(),
        })
        .unwrap();
        assert_eq!(
            db.lookup(fire.id).unwrap().extra_authors.iter().copied().collect::<Vec<_>>(),
            vec![UserId(2), UserId(4)]
        );
    }

    #[test]
    fn create_from_combination_registers_recipe() {
        let db = seeded();
        let combo = Combination::new([ElementId(3), ElementId(1)]).unwrap();
        let applied = db
            .apply_mutation(&Mutation::CreateElement {
                combination: combo.clone(),
                name: name("Mist"),
                author: UserId(7),
            })
            .unwrap();
        let mist = applied.element().clone();
        assert!(matches!(applied, Applied::Created(_)));
        assert_eq!(db.find_recipe(&combo).unwrap().id, mist.id);
        assert_eq!(mist.origin, Some(combo.clone()));
        assert_eq!(db.recipe_count(), 1);

        // Same combination cannot be claimed twice
        let err = db
            .apply_mutation(&Mutation::CreateElement {
                combination: combo,
                name: name("Fog"),
                author: UserId(7),
            })
            .unwrap_err();
        assert!(matches!(err, DatabaseError::RecipeExists { .. }));
        assert!(!db.has_element("Fog"));
    }

    #[test]
    fn create_with_unknown_input_changes_nothing() {
        let db = seeded();
        let err = db
            .apply_mutation(&Mutation::CreateElement {
                combination: Combination::new([ElementId(1), ElementId(50)]).unwrap(),
                name: name("Ghost"),
                author: UserId(7),
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(db.element_count(), 3);
        assert!(db.user(UserId(7)).is_none());
    }

    #[test]
    fn add_recipe_links_existing_element() {
        let db = seeded();
        let mud = user_element(&db, "Mud", 1);
        let combo = Combination::new([ElementId(2), ElementId(3)]).unwrap();
        let applied = db
            .apply_mutation(&Mutation::AddRecipe {
                combination: combo.clone(),
                output: mud.id,
            })
            .unwrap();
        assert!(matches!(applied, Applied::Linked { .. }));
        assert_eq!(db.find_recipe(&combo).unwrap().name.as_str(), "Mud");
    }

    #[test]
    fn login_and_grant() {
        let db = seeded();
        let user = db.login(UserId(42));
        assert!(user.inventory.is_empty());
        assert_eq!(db.user_count(), 1);
        db.login(UserId(42));
        assert_eq!(db.user_count(), 1);

        assert!(db.grant(UserId(42), ElementId(1)).unwrap());
        assert!(!db.grant(UserId(42), ElementId(1)).unwrap());
        assert_eq!(
            db.grant(UserId(43), ElementId(1)).unwrap_err(),
            DatabaseError::UserNotFound(UserId(43))
        );
    }
}
