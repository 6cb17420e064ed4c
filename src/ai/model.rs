use std::rc::Rc;
use std::sync::Arc;

use super::observation::Observation;
use crate::game::Action;

/// Anything that scores the three steering actions for an observation.
///
/// Implemented by the DQN inference network; neural players only see this trait.
pub trait QValueModel {
    fn q_values(&self, obs: &Observation) -> [f32; Action::COUNT];
}

impl<M: QValueModel + ?Sized> QValueModel for Box<M> {
    fn q_values(&self, obs: &Observation) -> [f32; Action::COUNT] {
        (**self).q_values(obs)
    }
}

impl<M: QValueModel + ?Sized> QValueModel for Rc<M> {
    fn q_values(&self, obs: &Observation) -> [f32; Action::COUNT] {
        (**self).q_values(obs)
    }
}

impl<M: QValueModel + ?Sized> QValueModel for Arc<M> {
    fn q_values(&self, obs: &Observation) -> [f32; Action::COUNT] {
        (**self).q_values(obs)
    }
}
